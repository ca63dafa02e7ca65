//! Provider failure taxonomy

use std::time::Duration;
use thiserror::Error;

/// Why a provider submission did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider reported a failure
    #[error("{0}")]
    Failed(String),
    /// The provider let go of the request without ever notifying
    #[error("provider released the request without a result")]
    Dropped,
    /// No notification arrived within the configured timeout
    #[error("no result after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
