// MIT License - Copyright (c) 2026 Peter Wright
// Error types

use std::fmt;

/// Error type produced by [`AlarmClient`](crate::client::AlarmClient) implementations.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// All errors that can occur inside the synchronization engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("Remote error during {operation}: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("Remote call timed out: {operation}")]
    RequestTimeout { operation: &'static str },

    #[error("Unrecognized state: {value}")]
    UnrecognizedState { value: String },

    #[error("No panel found in Yale Sync account")]
    NoPanel,
}

impl SyncError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        SyncError::ServiceUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether this error means the engine can never make progress,
    /// regardless of how often the operation is repeated.
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(self, SyncError::ConfigInvalid(_) | SyncError::NoPanel)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// The only failure a host ever sees from a [`SecuritySystem`](crate::accessory::SecuritySystem).
///
/// Every internal [`SyncError`] collapses into this one signal so that the
/// accessory shows up as "not responding" without leaking engine details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceUnavailable;

impl fmt::Display for ServiceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Service communication failure")
    }
}

impl std::error::Error for ServiceUnavailable {}

impl From<SyncError> for ServiceUnavailable {
    fn from(_: SyncError) -> Self {
        ServiceUnavailable
    }
}
