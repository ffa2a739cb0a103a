//! Store — the single shared state container behind every facade.
//!
//! State lives in a `watch` channel: readers take snapshots or subscribe, writers
//! apply partial updates. Updates are last-writer-wins; there is no versioning.
//! Every mutation is tagged with an action label and traced at debug level.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::gateway::User;

pub mod context;
pub mod error;

pub use context::{Context, Op};
pub use error::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

impl Session {
    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub gateway_ready: bool,
    pub session: Session,
    /// Label of the most recent mutation, for diagnostics.
    pub last_action: &'static str,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            is_loading: false,
            error: None,
            gateway_ready: false,
            session: Session::signed_out(),
            last_action: "init",
        }
    }
}

#[derive(Clone)]
pub struct Store {
    tx: Arc<watch::Sender<StoreState>>,
}

impl Store {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StoreState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.tx.subscribe()
    }

    /// Applies a partial update under `action`.
    pub fn update(&self, action: &'static str, apply: impl FnOnce(&mut StoreState)) {
        self.tx.send_modify(|state| {
            apply(state);
            state.last_action = action;
        });
        debug!(action, "store updated");
    }

    /// Records a failure and drops the loading flag. The session is left alone.
    pub fn fail(&self, err: &StoreError) {
        warn!(action = err.action(), error = %err, "gateway operation failed");
        let message = err.to_string();
        self.update(err.action(), |state| {
            state.error = Some(message);
            state.is_loading = false;
        });
    }

    /// Records a failure and also clears the session.
    pub fn fail_signed_out(&self, err: &StoreError) {
        warn!(action = err.action(), error = %err, "gateway operation failed; session cleared");
        let message = err.to_string();
        self.update(err.action(), |state| {
            state.error = Some(message);
            state.is_loading = false;
            state.session = Session::signed_out();
        });
    }

    /// Clears the error field. A no-op, including for `last_action`, when already clear.
    pub fn clear_error(&self) {
        let cleared = self.tx.send_if_modified(|state| {
            if state.error.is_none() {
                return false;
            }
            state.error = None;
            state.last_action = "error/clear";
            true
        });
        if cleared {
            debug!(action = "error/clear", "store updated");
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
