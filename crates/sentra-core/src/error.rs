//! Error taxonomy shared across the workspace
//!
//! Every terminal error the engine can surface to a caller is one of these
//! variants. Scoring itself never fails; only validation, the store, and the
//! lifecycle state machine produce errors.

use crate::types::TransactionState;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Engine error
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation failure; surfaced to the caller, never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing transaction or profile on a direct read
    #[error("Not found: {0}")]
    NotFound(String),

    /// Lifecycle precondition violated
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: TransactionState,
        to: TransactionState,
    },

    /// Optimistic-concurrency loss after the bounded retry
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store I/O fault after retry exhaustion
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Request deadline exceeded
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Caller cancelled the request before it completed
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Unclassified failure, logged with a correlation id
    #[error("Internal error [{correlation_id}]: {message}")]
    Internal {
        correlation_id: Uuid,
        message: String,
    },
}

impl CoreError {
    /// Stable machine-readable code for the transport layer
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidInput(_) => "INVALID_INPUT",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            CoreError::Timeout(_) => "TIMEOUT",
            CoreError::Cancelled(_) => "CANCELLED",
            CoreError::Internal { .. } => "INTERNAL",
        }
    }

    /// Construct an internal error with a fresh correlation id
    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal {
            correlation_id: Uuid::new_v4(),
            message: message.into(),
        }
    }
}
