//! Persistence error model.

use thiserror::Error;

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Infrastructure-level persistence failure.
///
/// These never terminate the process: WAL failures abort the in-flight
/// append, recovery failures degrade the store to empty.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Another process holds the data directory's advisory lock.
    #[error("data directory already locked: {0}")]
    LockHeld(String),

    #[error("snapshot failed: {0}")]
    Snapshot(String),

    /// Recovered data failed the all-or-nothing integrity check.
    #[error("integrity violation for tenant '{tenant}': {reason}")]
    IntegrityViolation { tenant: String, reason: String },
}
