use std::sync::Arc;

use crate::gateway::{Gateway, GatewayProbe};

use super::{Store, StoreError};

/// Action labels and fallback message for one facade operation.
#[derive(Debug, Clone, Copy)]
pub struct Op {
    pub success: &'static str,
    pub error: &'static str,
    pub fallback: &'static str,
}

impl Op {
    pub const fn new(success: &'static str, error: &'static str, fallback: &'static str) -> Self {
        Self {
            success,
            error,
            fallback,
        }
    }
}

/// What every facade is constructed with: the shared store and the gateway probe.
/// Owned by the composition root and cloned into each facade.
#[derive(Clone)]
pub struct Context {
    store: Store,
    probe: Arc<dyn GatewayProbe>,
}

impl Context {
    pub fn new(store: Store, probe: Arc<dyn GatewayProbe>) -> Self {
        Self { store, probe }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn probe(&self) -> &dyn GatewayProbe {
        self.probe.as_ref()
    }

    /// Resolves the gateway or fails closed: records the unavailability under
    /// `action`, clears the session, and returns the error without any gateway call.
    pub fn gateway(&self, action: &'static str) -> Result<Arc<dyn Gateway>, StoreError> {
        match self.probe.current() {
            Some(gateway) => Ok(gateway),
            None => {
                let err = StoreError::Unavailable { action };
                self.store.fail_signed_out(&err);
                Err(err)
            }
        }
    }

    /// Folds a settled gateway call into the store. Success clears any previous
    /// error; failure is recorded and handed back as a value.
    pub fn settle<T>(&self, op: Op, result: anyhow::Result<T>) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                self.store.update(op.success, |state| state.error = None);
                Ok(value)
            }
            Err(e) => {
                let err = StoreError::call(op.error, &e, op.fallback);
                self.store.fail(&err);
                Err(err)
            }
        }
    }
}
