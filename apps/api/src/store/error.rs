use std::time::Duration;

use thiserror::Error;

/// Failure of a facade or lifecycle operation.
///
/// Every variant carries the action label it was raised under. The display string is
/// exactly what lands in the store's shared `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Gateway not available")]
    Unavailable { action: &'static str },

    #[error("{message}")]
    Call {
        action: &'static str,
        message: String,
    },

    #[error("Gateway failed to load within {} seconds", .after.as_secs())]
    ReadinessTimeout { after: Duration },
}

pub const READINESS_TIMEOUT_ACTION: &str = "init/timeout";

impl StoreError {
    pub fn action(&self) -> &'static str {
        match self {
            StoreError::Unavailable { action } | StoreError::Call { action, .. } => action,
            StoreError::ReadinessTimeout { .. } => READINESS_TIMEOUT_ACTION,
        }
    }

    /// Converts a rejected gateway call. Falls back to `fallback` when the
    /// underlying error has nothing to say.
    pub fn call(action: &'static str, err: &anyhow::Error, fallback: &str) -> Self {
        let message = err.to_string();
        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };
        StoreError::Call { action, message }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::ReadinessTimeout { .. }
        )
    }
}
