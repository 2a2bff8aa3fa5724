//! Persistence configuration.

use std::path::PathBuf;

/// Default WAL segment rotation threshold: 100 MiB.
pub const DEFAULT_MAX_SEGMENT_BYTES: u64 = 100 * 1024 * 1024;

/// Configuration for the [`PersistenceManager`](crate::PersistenceManager).
///
/// The data directory holds the active WAL segment (`current.wal`), rotated
/// segments (`wal_<stamp>.log`), snapshots (`snapshot_<stamp>.json`) and
/// the advisory lock file (`.lock`).
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub data_dir: PathBuf,
    /// Size threshold above which the active segment is rotated.
    pub max_segment_bytes: u64,
}

impl PersistenceConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_segment_bytes: DEFAULT_MAX_SEGMENT_BYTES,
        }
    }

    pub fn with_max_segment_bytes(mut self, bytes: u64) -> Self {
        self.max_segment_bytes = bytes;
        self
    }
}
