//! Session/Auth Manager — sign-in, sign-out, refresh and status checks.
//!
//! Each operation raises `is_loading` before its gateway call and drops it once the
//! call settles. Any failure leaves the session unauthenticated.

use anyhow::Result;
use tracing::info;

use crate::gateway::{AuthApi, User};
use crate::store::{Context, Session, StoreError};

const CHECK_STATUS_ERROR: &str = "auth/checkStatus/error";
const SIGN_IN_ERROR: &str = "auth/signIn/error";
const SIGN_OUT_ERROR: &str = "auth/signOut/error";
const REFRESH_ERROR: &str = "auth/refreshUser/error";

#[derive(Clone)]
pub struct Auth {
    ctx: Context,
}

impl Auth {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn user(&self) -> Option<User> {
        self.ctx.store().snapshot().session.user
    }

    pub fn is_authenticated(&self) -> bool {
        self.ctx.store().snapshot().session.is_authenticated
    }

    /// Queries sign-in status and normalizes the session to match.
    /// Never fails: errors are recorded in the store and reported as `false`.
    pub async fn check_status(&self) -> bool {
        let Ok(gateway) = self.ctx.gateway(CHECK_STATUS_ERROR) else {
            return false;
        };
        self.begin("auth/checkStatus/loading");

        match resolve_user(gateway.auth()).await {
            Ok(Some(user)) => {
                self.ctx.store().update("auth/checkStatus/authenticated", |s| {
                    s.session = Session::authenticated(user);
                    s.is_loading = false;
                });
                true
            }
            Ok(None) => {
                self.ctx.store().update("auth/checkStatus/unauthenticated", |s| {
                    s.session = Session::signed_out();
                    s.is_loading = false;
                });
                false
            }
            Err(e) => {
                let err = StoreError::call(CHECK_STATUS_ERROR, &e, "Failed to check auth status");
                self.ctx.store().fail_signed_out(&err);
                false
            }
        }
    }

    /// Runs the gateway sign-in flow, then re-checks status to settle the session.
    pub async fn sign_in(&self) -> Result<(), StoreError> {
        let gateway = self.ctx.gateway(SIGN_IN_ERROR)?;
        self.begin("auth/signIn/loading");

        if let Err(e) = gateway.auth().sign_in().await {
            let err = StoreError::call(SIGN_IN_ERROR, &e, "Sign in failed");
            self.ctx.store().fail_signed_out(&err);
            return Err(err);
        }

        if self.check_status().await {
            if let Some(user) = self.user() {
                info!("Signed in as {}", user.username);
            }
        }
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), StoreError> {
        let gateway = self.ctx.gateway(SIGN_OUT_ERROR)?;
        self.begin("auth/signOut/loading");

        match gateway.auth().sign_out().await {
            Ok(()) => {
                self.ctx.store().update("auth/signOut/success", |s| {
                    s.session = Session::signed_out();
                    s.is_loading = false;
                });
                info!("Signed out");
                Ok(())
            }
            Err(e) => {
                let err = StoreError::call(SIGN_OUT_ERROR, &e, "Sign out failed");
                self.ctx.store().fail_signed_out(&err);
                Err(err)
            }
        }
    }

    /// Re-fetches the identity without going through sign-in.
    pub async fn refresh(&self) -> Result<User, StoreError> {
        let gateway = self.ctx.gateway(REFRESH_ERROR)?;
        self.begin("auth/refreshUser/loading");

        match gateway.auth().get_user().await {
            Ok(user) => {
                let session = Session::authenticated(user.clone());
                self.ctx.store().update("auth/refreshUser/success", |s| {
                    s.session = session;
                    s.is_loading = false;
                });
                Ok(user)
            }
            Err(e) => {
                let err = StoreError::call(REFRESH_ERROR, &e, "Failed to refresh user");
                self.ctx.store().fail_signed_out(&err);
                Err(err)
            }
        }
    }

    fn begin(&self, action: &'static str) {
        self.ctx.store().update(action, |s| {
            s.is_loading = true;
            s.error = None;
        });
    }
}

async fn resolve_user(auth: &dyn AuthApi) -> Result<Option<User>> {
    if auth.is_signed_in().await? {
        Ok(Some(auth.get_user().await?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gateway::GatewaySlot;
    use crate::store::Store;
    use crate::testing::{context_with, stub_user, StubGateway};

    #[tokio::test]
    async fn test_check_status_authenticated() {
        let stub = Arc::new(StubGateway::signed_in());
        let auth = Auth::new(context_with(stub.clone()));

        assert!(auth.check_status().await);
        assert!(auth.is_authenticated());
        assert_eq!(auth.user(), Some(stub_user()));
    }

    #[tokio::test]
    async fn test_check_status_unauthenticated() {
        let stub = Arc::new(StubGateway::default());
        let auth = Auth::new(context_with(stub.clone()));

        assert!(!auth.check_status().await);
        assert_eq!(auth.user(), None);
        assert_eq!(stub.args_of("auth.get_user").len(), 0);
    }

    #[tokio::test]
    async fn test_check_status_without_gateway_makes_no_call() {
        let stub = Arc::new(StubGateway::signed_in());
        let slot = GatewaySlot::empty();
        let ctx = Context::new(Store::new(), Arc::new(slot.clone()));
        let auth = Auth::new(ctx.clone());

        assert!(!auth.check_status().await);
        assert_eq!(stub.call_count(), 0);
        let state = ctx.store().snapshot();
        assert!(state.error.unwrap().contains("not available"));
        assert_eq!(state.last_action, CHECK_STATUS_ERROR);

        slot.install(stub.clone());
        assert!(auth.check_status().await);
        assert!(ctx.store().snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_check_status_failure_is_captured() {
        let stub = Arc::new(StubGateway::failing("network down"));
        let ctx = context_with(stub);
        let auth = Auth::new(ctx.clone());

        assert!(!auth.check_status().await);
        let state = ctx.store().snapshot();
        assert_eq!(state.error.as_deref(), Some("network down"));
        assert!(!state.is_loading);
        assert!(!state.session.is_authenticated);
    }

    #[tokio::test]
    async fn test_sign_in_normalizes_through_check_status() {
        let stub = Arc::new(StubGateway::default());
        let ctx = context_with(stub.clone());
        let auth = Auth::new(ctx.clone());

        auth.sign_in().await.unwrap();

        let methods: Vec<_> = stub.calls().into_iter().map(|c| c.method).collect();
        assert_eq!(
            methods,
            vec!["auth.sign_in", "auth.is_signed_in", "auth.get_user"]
        );
        let state = ctx.store().snapshot();
        assert!(state.session.is_authenticated);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_session_unauthenticated() {
        let stub = Arc::new(StubGateway::failing("popup closed"));
        let ctx = context_with(stub);
        let auth = Auth::new(ctx.clone());

        let err = auth.sign_in().await.unwrap_err();
        assert_eq!(err.action(), SIGN_IN_ERROR);
        let state = ctx.store().snapshot();
        assert_eq!(state.error.as_deref(), Some("popup closed"));
        assert!(!state.is_loading);
        assert!(!state.session.is_authenticated);
    }

    #[tokio::test]
    async fn test_sign_out_clears_identity() {
        let stub = Arc::new(StubGateway::signed_in());
        let auth = Auth::new(context_with(stub));

        assert!(auth.check_status().await);
        auth.sign_out().await.unwrap();

        assert!(!auth.is_authenticated());
        assert_eq!(auth.user(), None);
    }

    #[tokio::test]
    async fn test_refresh_sets_authenticated() {
        let stub = Arc::new(StubGateway::default());
        let auth = Auth::new(context_with(stub));

        let user = auth.refresh().await.unwrap();
        assert_eq!(user, stub_user());
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_every_operation_fails_closed_without_gateway() {
        let ctx = crate::testing::context_without_gateway();
        let auth = Auth::new(ctx.clone());

        assert!(auth.sign_in().await.unwrap_err().is_unavailable());
        assert!(auth.sign_out().await.unwrap_err().is_unavailable());
        assert!(auth.refresh().await.unwrap_err().is_unavailable());
        assert_eq!(ctx.store().snapshot().last_action, REFRESH_ERROR);
    }
}
