// Facades over the platform gateway.
// Every facade is built from the same `Context` and reports failures through the
// shared store as well as its return value. Nothing here panics on a gateway error.

pub mod auth;
pub mod inference;
pub mod kv;
pub mod readiness;
pub mod storage;

use tokio::task::JoinHandle;

pub use auth::Auth;
pub use inference::Inference;
pub use kv::KeyValue;
pub use readiness::{Readiness, ReadinessConfig};
pub use storage::Storage;

use crate::store::{Context, StoreError, StoreState};

/// Composition of the store, the four facades and the readiness poller.
#[derive(Clone)]
pub struct Platform {
    ctx: Context,
    pub auth: Auth,
    pub fs: Storage,
    pub ai: Inference,
    pub kv: KeyValue,
    readiness: Readiness,
}

impl Platform {
    pub fn new(ctx: Context, readiness: ReadinessConfig) -> Self {
        let auth = Auth::new(ctx.clone());
        Self {
            fs: Storage::new(ctx.clone()),
            ai: Inference::new(ctx.clone()),
            kv: KeyValue::new(ctx.clone()),
            readiness: Readiness::new(ctx.clone(), auth.clone(), readiness),
            auth,
            ctx,
        }
    }

    /// Starts the readiness poller; later calls are no-ops.
    pub fn init(&self) -> Option<JoinHandle<Result<(), StoreError>>> {
        self.readiness.init()
    }

    pub fn clear_error(&self) {
        self.ctx.store().clear_error();
    }

    pub fn state(&self) -> StoreState {
        self.ctx.store().snapshot()
    }
}
