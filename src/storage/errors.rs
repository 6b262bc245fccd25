//! Storage error types.

use thiserror::Error;

/// Errors from a `KeyValueStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failed.
    #[error("database error: {reason}")]
    DatabaseError { reason: String },

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError {
            reason: e.to_string(),
        }
    }
}

/// Rejections when saving a user-entered credential.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential is empty")]
    Empty,

    /// Does not start with the required literal prefix.
    #[error("credential must start with '{prefix}'")]
    InvalidFormat { prefix: String },

    #[error("failed to persist credential: {reason}")]
    Persist { reason: String },
}
