//! `stockledger-persistence` — durability for the inventory ledger.
//!
//! Write-ahead logging with size-based segment rotation, filename-ordered
//! replay recovery, all-or-nothing integrity validation, atomic snapshots,
//! and an exclusive advisory lock on the data directory.

pub mod codec;
pub mod config;
pub mod error;
pub mod lock;
pub mod manager;
pub mod snapshot;
pub mod wal;

pub use config::{DEFAULT_MAX_SEGMENT_BYTES, PersistenceConfig};
pub use error::{PersistenceError, PersistenceResult};
pub use lock::DirLock;
pub use manager::{PersistenceManager, RecoveredData, StorageInfo};
pub use wal::WriteAheadLog;
