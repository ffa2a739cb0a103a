use std::sync::Arc;

use tokio::sync::watch;

use super::Gateway;

/// Answers "is the gateway handle available right now?".
///
/// Facades and the readiness poller only ever go through this query, so tests can
/// swap in a handle that is absent, present, or appears later.
pub trait GatewayProbe: Send + Sync {
    fn current(&self) -> Option<Arc<dyn Gateway>>;
}

/// Production probe: an initially empty slot that the background platform connector
/// fills once every backend is reachable.
#[derive(Clone)]
pub struct GatewaySlot {
    tx: Arc<watch::Sender<Option<Arc<dyn Gateway>>>>,
}

impl GatewaySlot {
    pub fn empty() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with(gateway: Arc<dyn Gateway>) -> Self {
        let slot = Self::empty();
        slot.install(gateway);
        slot
    }

    pub fn install(&self, gateway: Arc<dyn Gateway>) {
        self.tx.send_replace(Some(gateway));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for GatewaySlot {
    fn default() -> Self {
        Self::empty()
    }
}

impl GatewayProbe for GatewaySlot {
    fn current(&self) -> Option<Arc<dyn Gateway>> {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubGateway;

    #[test]
    fn test_empty_slot_has_no_gateway() {
        assert!(GatewaySlot::empty().current().is_none());
    }

    #[test]
    fn test_install_then_clear() {
        let slot = GatewaySlot::empty();
        slot.install(Arc::new(StubGateway::default()));
        assert!(slot.current().is_some());
        slot.clear();
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_clones_share_the_same_slot() {
        let slot = GatewaySlot::empty();
        let observer = slot.clone();
        slot.install(Arc::new(StubGateway::default()));
        assert!(observer.current().is_some());
    }
}
