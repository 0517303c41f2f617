//! Error types for the store layer

use sentra_core::CoreError;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Compare-and-set precondition failed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization of a JSON column failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error (when the postgres feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O fault; callers retry these with bounded backoff
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the retry policy should attempt this operation again
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            #[cfg(feature = "postgres")]
            StoreError::Database(err) => !matches!(err, sqlx::Error::RowNotFound),
            _ => false,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoreError::NotFound(what),
            StoreError::Conflict(what) => CoreError::Conflict(what),
            other => CoreError::StoreUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_retryable() {
        assert!(StoreError::Unavailable("connection reset".into()).is_retryable());
        assert!(!StoreError::NotFound("tx".into()).is_retryable());
        assert!(!StoreError::Conflict("state".into()).is_retryable());
    }

    #[test]
    fn test_maps_into_core_taxonomy() {
        let core: CoreError = StoreError::NotFound("profile u1".into()).into();
        assert_eq!(core.code(), "NOT_FOUND");

        let core: CoreError = StoreError::Conflict("status changed".into()).into();
        assert_eq!(core.code(), "CONFLICT");

        let core: CoreError = StoreError::Unavailable("io".into()).into();
        assert_eq!(core.code(), "STORE_UNAVAILABLE");
    }
}
