use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::gateway::{AuthApi, User};
use crate::models::user::UserRow;

/// The account this process signs in as.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub email: Option<String>,
}

/// PostgreSQL-backed auth. Holds at most one session token at a time.
pub struct PgAuth {
    pool: PgPool,
    account: Account,
    token: RwLock<Option<Uuid>>,
}

impl PgAuth {
    pub fn new(pool: PgPool, account: Account) -> Self {
        Self {
            pool,
            account,
            token: RwLock::new(None),
        }
    }
}

#[async_trait]
impl AuthApi for PgAuth {
    async fn is_signed_in(&self) -> Result<bool> {
        let Some(token) = *self.token.read().await else {
            return Ok(false);
        };
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sessions WHERE token = $1)")
                .bind(token)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get_user(&self) -> Result<User> {
        let token = (*self.token.read().await).ok_or_else(|| anyhow!("Not signed in"))?;
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.email, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from)
            .ok_or_else(|| anyhow!("Session expired"))
    }

    async fn sign_in(&self) -> Result<()> {
        let user_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (id, username, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO UPDATE SET email = EXCLUDED.email
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&self.account.username)
        .bind(&self.account.email)
        .fetch_one(&self.pool)
        .await?;

        let token = Uuid::new_v4();
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        *self.token.write().await = Some(token);
        info!("Opened session for {}", self.account.username);
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        let mut held = self.token.write().await;
        let Some(token) = *held else {
            return Ok(());
        };
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        // Dropped only once the row is gone, so a failed delete can be retried.
        *held = None;
        Ok(())
    }
}
