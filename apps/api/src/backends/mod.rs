//! Concrete platform gateway: PostgreSQL auth, S3 storage, Redis key-value,
//! and LLM inference behind one `Gateway` handle.
//!
//! The handle is built in the background at startup and installed into the
//! `GatewaySlot` only once every backend has answered.

pub mod llm_inference;
pub mod pg_auth;
pub mod redis_kv;
pub mod s3_storage;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::create_pool;
use crate::gateway::{AiApi, AuthApi, FsApi, Gateway, GatewaySlot, KvApi};
use crate::llm_client::{self, LlmClient};

pub use llm_inference::LlmInference;
pub use pg_auth::{Account, PgAuth};
pub use redis_kv::RedisKv;
pub use s3_storage::S3Storage;

pub struct PlatformGateway {
    auth: PgAuth,
    fs: S3Storage,
    ai: LlmInference,
    kv: RedisKv,
}

impl Gateway for PlatformGateway {
    fn auth(&self) -> &dyn AuthApi {
        &self.auth
    }

    fn fs(&self) -> &dyn FsApi {
        &self.fs
    }

    fn ai(&self) -> &dyn AiApi {
        &self.ai
    }

    fn kv(&self) -> &dyn KvApi {
        &self.kv
    }
}

/// Connects every backend and assembles the gateway.
pub async fn connect(config: &Config) -> Result<PlatformGateway> {
    let db = create_pool(&config.database_url).await?;

    let redis = redis::Client::open(config.redis_url.clone())?;
    let mut conn = redis
        .get_multiplexed_async_connection()
        .await
        .context("Failed to connect to Redis")?;
    redis::cmd("PING")
        .query_async::<_, String>(&mut conn)
        .await
        .context("Redis did not answer PING")?;
    info!("Redis connection established");

    let s3 = build_s3_client(config).await;
    s3.head_bucket()
        .bucket(&config.s3_bucket)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 bucket '{}' unreachable: {e}", config.s3_bucket))?;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    Ok(PlatformGateway {
        auth: PgAuth::new(
            db,
            Account {
                username: config.account_username.clone(),
                email: config.account_email.clone(),
            },
        ),
        fs: S3Storage::new(s3, config.s3_bucket.clone()),
        ai: LlmInference::new(llm),
        kv: RedisKv::new(conn, config.kv_namespace.clone()),
    })
}

/// Keeps trying to connect until it succeeds, then installs the gateway.
/// The readiness poller decides independently how long it is willing to wait.
pub async fn connect_into(config: Config, slot: GatewaySlot) {
    let mut delay = Duration::from_millis(250);
    loop {
        match connect(&config).await {
            Ok(gateway) => {
                slot.install(Arc::new(gateway));
                info!("Platform gateway installed");
                return;
            }
            Err(e) => {
                warn!("Platform connect failed: {e:#}; retrying in {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(5));
            }
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resume-review-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
