//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger layer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Keep this focused on deterministic append/query failures (validation,
/// duplicates, the durability barrier). Recovery-time and file-level
/// failures live in the persistence crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A required field was missing or malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Movement kind was neither inbound nor outbound.
    #[error("invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// The tenant already has a published event with this transaction id.
    #[error("duplicate transaction id: {0}")]
    DuplicateTransactionId(String),

    /// The write-ahead log rejected the event; memory state is unchanged.
    #[error("WAL write failed: {0}")]
    WalWriteFailed(String),

    /// The ledger's reserved arena is full; the event was not appended.
    #[error("ledger storage exhausted at index {0}")]
    StorageExhausted(usize),
}

impl LedgerError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn invalid_type(kind: impl Into<String>) -> Self {
        Self::InvalidTransactionType(kind.into())
    }

    pub fn duplicate(trans_id: impl Into<String>) -> Self {
        Self::DuplicateTransactionId(trans_id.into())
    }

    pub fn wal_write(msg: impl Into<String>) -> Self {
        Self::WalWriteFailed(msg.into())
    }
}
