//! Durability manager: WAL, snapshots, recovery, integrity, advisory lock.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use stockledger_core::TenantId;
use stockledger_events::MovementEvent;

use crate::config::PersistenceConfig;
use crate::error::{PersistenceError, PersistenceResult};
use crate::lock::DirLock;
use crate::snapshot;
use crate::wal::WriteAheadLog;
use crate::codec;

/// Per-tenant event sequences as reconstructed from disk.
pub type RecoveredData = HashMap<TenantId, Vec<MovementEvent>>;

/// Data directory status for operators.
#[derive(Debug, Clone)]
pub struct StorageInfo {
    pub data_dir: PathBuf,
    pub active_segment: PathBuf,
    pub active_segment_bytes: u64,
    pub rotated_segments: usize,
    pub latest_snapshot: Option<PathBuf>,
    pub last_snapshot_time: Option<String>,
}

/// Owns everything under the data directory.
///
/// Construction takes the directory's advisory lock and opens the active
/// WAL segment; both are held until drop. A second manager pointed at the
/// same directory fails to open.
pub struct PersistenceManager {
    config: PersistenceConfig,
    wal: WriteAheadLog,
    last_snapshot_time: Mutex<Option<String>>,
    // Held for the manager's lifetime; released on drop.
    _lock: DirLock,
}

impl PersistenceManager {
    pub fn open(config: PersistenceConfig) -> PersistenceResult<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let lock = DirLock::acquire(&config.data_dir)?;
        let wal = WriteAheadLog::open(&config.data_dir, config.max_segment_bytes)?;

        info!(
            data_dir = %config.data_dir.display(),
            wal_bytes = wal.active_len(),
            "persistence manager opened"
        );

        Ok(Self {
            config,
            wal,
            last_snapshot_time: Mutex::new(None),
            _lock: lock,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Durably append one event to the WAL. Returns the receipt timestamp.
    ///
    /// No internal retry: a failure here must abort the caller's append
    /// before any memory mutation.
    pub fn write_to_wal(
        &self,
        tenant_id: &TenantId,
        event: &MovementEvent,
    ) -> PersistenceResult<String> {
        self.wal.append(tenant_id, event)
    }

    /// Replay every WAL segment into per-tenant event sequences.
    ///
    /// Segments replay in filename-sorted order with the active segment
    /// last. Unreadable segments and malformed lines are logged and
    /// skipped; only the integrity check decides whether the result is
    /// trustworthy.
    pub fn recover_from_wal(&self) -> PersistenceResult<RecoveredData> {
        let mut data: RecoveredData = HashMap::new();
        let mut skipped = 0usize;

        for segment in WriteAheadLog::replay_order(&self.config.data_dir)? {
            let file = match File::open(&segment) {
                Ok(f) => f,
                Err(e) => {
                    warn!(segment = %segment.display(), error = %e, "cannot open WAL segment");
                    continue;
                }
            };

            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                match codec::decode_line(&line) {
                    Ok((tenant_id, event)) => {
                        data.entry(tenant_id).or_default().push(event);
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(segment = %segment.display(), error = %e, "skipping malformed WAL line");
                    }
                }
            }
        }

        let total: usize = data.values().map(Vec::len).sum();
        debug!(tenants = data.len(), events = total, skipped, "WAL recovery complete");
        Ok(data)
    }

    /// All-or-nothing integrity check over recovered data.
    ///
    /// Per tenant: receipt timestamps must be non-decreasing and every
    /// event must satisfy the live-append field rules. The first violation
    /// fails the whole recovery; the caller falls back to an empty store.
    pub fn validate_integrity(data: &RecoveredData) -> PersistenceResult<()> {
        for (tenant_id, events) in data {
            for pair in events.windows(2) {
                if pair[1].timestamp < pair[0].timestamp {
                    return Err(PersistenceError::IntegrityViolation {
                        tenant: tenant_id.to_string(),
                        reason: format!(
                            "timestamp order violation: '{}' after '{}'",
                            pair[1].timestamp, pair[0].timestamp
                        ),
                    });
                }
            }
            for event in events {
                event
                    .validate()
                    .map_err(|e| PersistenceError::IntegrityViolation {
                        tenant: tenant_id.to_string(),
                        reason: format!("invalid event '{}': {e}", event.trans_id),
                    })?;
            }
        }
        Ok(())
    }

    /// Write a snapshot of `data`, atomically replacing nothing until it is
    /// complete. Records the snapshot time for `storage_info`.
    pub fn create_snapshot(&self, data: &RecoveredData) -> PersistenceResult<PathBuf> {
        let path = snapshot::write_snapshot(&self.config.data_dir, data)?;
        let now = stockledger_events::timestamp::now_utc();
        *self
            .last_snapshot_time
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(now);
        info!(snapshot = %path.display(), tenants = data.len(), "snapshot created");
        Ok(path)
    }

    /// Load the newest snapshot, if any.
    ///
    /// This is the fast-recovery building block; `recover_from_wal` remains
    /// the source of truth until a WAL truncation policy pairs the two.
    pub fn load_latest_snapshot(&self) -> PersistenceResult<RecoveredData> {
        snapshot::load_latest(&self.config.data_dir)
    }

    /// Explicit archival pass: delete rotated segments whose filename stamp
    /// sorts strictly before `stamp` (`%Y%m%d_%H%M%S` shape). The active
    /// segment is never touched. Returns how many segments were removed.
    pub fn prune_segments_before(&self, stamp: &str) -> PersistenceResult<usize> {
        let cutoff = format!("wal_{stamp}");
        let mut removed = 0usize;

        for segment in WriteAheadLog::rotated_segments(&self.config.data_dir)? {
            let Some(name) = segment.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name < cutoff.as_str() {
                fs::remove_file(&segment)?;
                removed += 1;
                info!(segment = %segment.display(), "pruned WAL segment");
            }
        }

        Ok(removed)
    }

    pub fn storage_info(&self) -> PersistenceResult<StorageInfo> {
        let rotated = WriteAheadLog::rotated_segments(&self.config.data_dir)?;
        let latest_snapshot = snapshot::snapshot_files(&self.config.data_dir)?
            .last()
            .cloned();

        Ok(StorageInfo {
            data_dir: self.config.data_dir.clone(),
            active_segment: self.wal.active_path(),
            active_segment_bytes: self.wal.active_len(),
            rotated_segments: rotated.len(),
            latest_snapshot,
            last_snapshot_time: self
                .last_snapshot_time
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        })
    }
}
