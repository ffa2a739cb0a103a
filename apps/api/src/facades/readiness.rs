//! Readiness Poller — waits for the gateway handle to appear.
//!
//! Checks immediately, then every `poll_interval` until the handle shows up or
//! `timeout` elapses. Runs at most once per `Readiness` (and its clones); there is
//! no retry after a timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::Auth;
use crate::store::{Context, StoreError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);
/// Floor applied to `poll_interval`; a zero period is not a valid tick rate.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct Readiness {
    ctx: Context,
    auth: Auth,
    config: ReadinessConfig,
    started: Arc<AtomicBool>,
}

impl Readiness {
    pub fn new(ctx: Context, auth: Auth, config: ReadinessConfig) -> Self {
        Self {
            ctx,
            auth,
            config,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the poller. Returns `None` if it was already started.
    pub fn init(&self) -> Option<JoinHandle<Result<(), StoreError>>> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Readiness poller already started");
            return None;
        }
        let poller = self.clone();
        Some(tokio::spawn(async move { poller.run().await }))
    }

    async fn run(&self) -> Result<(), StoreError> {
        let interval = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        let found = tokio::time::timeout(self.config.timeout, async {
            // First tick completes immediately.
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if self.ctx.probe().current().is_some() {
                    break;
                }
            }
        })
        .await;

        match found {
            Ok(()) => {
                self.ctx
                    .store()
                    .update("init/gatewayReady", |s| s.gateway_ready = true);
                info!("Gateway ready");
                self.auth.check_status().await;
                Ok(())
            }
            Err(_) => {
                let err = StoreError::ReadinessTimeout {
                    after: self.config.timeout,
                };
                error!("{err}");
                self.ctx.store().fail_signed_out(&err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewaySlot;
    use crate::store::Store;
    use crate::testing::StubGateway;

    fn setup() -> (GatewaySlot, Context, Readiness) {
        let slot = GatewaySlot::empty();
        let ctx = Context::new(Store::new(), Arc::new(slot.clone()));
        let auth = Auth::new(ctx.clone());
        let readiness = Readiness::new(ctx.clone(), auth, ReadinessConfig::default());
        (slot, ctx, readiness)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_immediately_triggers_status_check() {
        let (slot, ctx, readiness) = setup();
        let stub = Arc::new(StubGateway::signed_in());
        slot.install(stub.clone());

        readiness.init().unwrap().await.unwrap().unwrap();

        let state = ctx.store().snapshot();
        assert!(state.gateway_ready);
        assert!(state.error.is_none());
        assert!(state.session.is_authenticated);
        assert_eq!(stub.args_of("auth.is_signed_in").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_appearing_within_ceiling() {
        let (slot, ctx, readiness) = setup();
        let handle = readiness.init().unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_350)).await;
            slot.install(Arc::new(StubGateway::default()));
        });

        handle.await.unwrap().unwrap();
        let state = ctx.store().snapshot();
        assert!(state.gateway_ready);
        assert!(state.error.is_none());
        assert!(!state.session.is_authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_gateway_never_appears() {
        let (_slot, ctx, readiness) = setup();
        let started = tokio::time::Instant::now();

        let err = readiness.init().unwrap().await.unwrap().unwrap_err();

        assert!(started.elapsed() >= DEFAULT_READY_TIMEOUT);
        assert!(matches!(err, StoreError::ReadinessTimeout { .. }));
        let state = ctx.store().snapshot();
        assert!(!state.gateway_ready);
        assert_eq!(
            state.error.as_deref(),
            Some("Gateway failed to load within 10 seconds")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_after_timeout() {
        let (slot, ctx, readiness) = setup();
        readiness.init().unwrap().await.unwrap().unwrap_err();

        slot.install(Arc::new(StubGateway::default()));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!ctx.store().snapshot().gateway_ready);
        assert!(readiness.init().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_runs_once() {
        let (slot, _ctx, readiness) = setup();
        slot.install(Arc::new(StubGateway::default()));

        let first = readiness.init();
        let second = readiness.clone().init();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_times_out() {
        let ctx = Context::new(Store::new(), Arc::new(GatewaySlot::empty()));
        let readiness = Readiness::new(
            ctx.clone(),
            Auth::new(ctx.clone()),
            ReadinessConfig {
                poll_interval: Duration::ZERO,
                timeout: Duration::from_secs(1),
            },
        );

        let result = readiness.init().unwrap().await.unwrap();
        assert!(matches!(result, Err(StoreError::ReadinessTimeout { .. })));
        let state = ctx.store().snapshot();
        assert!(!state.gateway_ready);
        assert_eq!(
            state.error.as_deref(),
            Some("Gateway failed to load within 1 seconds")
        );
    }
}
