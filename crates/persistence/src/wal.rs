//! Active WAL segment: append, durable flush, size-based rotation.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info};

use stockledger_core::TenantId;
use stockledger_events::{MovementEvent, timestamp};

use crate::codec;
use crate::error::PersistenceResult;

/// Filename of the active segment.
pub const ACTIVE_SEGMENT: &str = "current.wal";

const ROTATED_PREFIX: &str = "wal_";
const ROTATED_SUFFIX: &str = ".log";

struct Segment {
    file: File,
    len: u64,
}

/// Append-only writer over the active WAL segment.
///
/// Every append serializes one line, writes it, flushes and fsyncs before
/// returning; there are no internal retries. When the segment grows past
/// the configured threshold it is renamed to `wal_<stamp>.log` and a fresh
/// `current.wal` is started. Rotated segments are retained until an
/// explicit pruning pass.
pub struct WriteAheadLog {
    data_dir: PathBuf,
    max_segment_bytes: u64,
    segment: Mutex<Segment>,
}

impl WriteAheadLog {
    pub fn open(data_dir: &Path, max_segment_bytes: u64) -> PersistenceResult<Self> {
        let path = data_dir.join(ACTIVE_SEGMENT);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len = file.metadata()?.len();

        debug!(path = %path.display(), len, "WAL segment opened");
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            max_segment_bytes,
            segment: Mutex::new(Segment { file, len }),
        })
    }

    /// Append one event. Returns the WAL receipt timestamp written as the
    /// line's first field.
    pub fn append(&self, tenant_id: &TenantId, event: &MovementEvent) -> PersistenceResult<String> {
        let receipt = timestamp::now_utc();
        let mut line = codec::encode_line(&receipt, tenant_id, event);
        line.push('\n');

        let mut segment = self.segment.lock().unwrap_or_else(|e| e.into_inner());
        segment.file.write_all(line.as_bytes())?;
        segment.file.flush()?;
        segment.file.sync_data()?;
        segment.len += line.len() as u64;

        if segment.len > self.max_segment_bytes {
            self.rotate(&mut segment)?;
        }

        Ok(receipt)
    }

    /// Current size of the active segment in bytes.
    pub fn active_len(&self) -> u64 {
        self.segment.lock().unwrap_or_else(|e| e.into_inner()).len
    }

    pub fn active_path(&self) -> PathBuf {
        self.data_dir.join(ACTIVE_SEGMENT)
    }

    fn rotate(&self, segment: &mut Segment) -> PersistenceResult<()> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let mut rotated = self
            .data_dir
            .join(format!("{ROTATED_PREFIX}{stamp}{ROTATED_SUFFIX}"));
        // Same-millisecond rotations get a disambiguating suffix that still
        // sorts after the base name.
        let mut attempt = 1;
        while rotated.exists() {
            rotated = self
                .data_dir
                .join(format!("{ROTATED_PREFIX}{stamp}_{attempt:02}{ROTATED_SUFFIX}"));
            attempt += 1;
        }

        segment.file.sync_all()?;
        fs::rename(self.active_path(), &rotated)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())?;
        info!(rotated = %rotated.display(), "WAL segment rotated");

        segment.file = file;
        segment.len = 0;
        Ok(())
    }

    /// Rotated segments in filename-sorted (chronological) order.
    pub fn rotated_segments(data_dir: &Path) -> PersistenceResult<Vec<PathBuf>> {
        let mut segments = Vec::new();
        for entry in fs::read_dir(data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(ROTATED_PREFIX) && name.ends_with(ROTATED_SUFFIX) {
                segments.push(entry.path());
            }
        }
        segments.sort();
        Ok(segments)
    }

    /// All segments in replay order: rotated ones first (filename-sorted),
    /// then the active segment.
    pub fn replay_order(data_dir: &Path) -> PersistenceResult<Vec<PathBuf>> {
        let mut segments = Self::rotated_segments(data_dir)?;
        let active = data_dir.join(ACTIVE_SEGMENT);
        if active.exists() {
            segments.push(active);
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_events::MovementKind;

    fn event(trans_id: &str) -> MovementEvent {
        MovementEvent {
            trans_id: trans_id.to_string(),
            item_id: "ITEM-1".into(),
            item_name: "Widget".into(),
            kind: MovementKind::In,
            quantity: 1,
            unit_price: 1.0,
            category: "tools".into(),
            model: "W-1".into(),
            unit: "pcs".into(),
            partner_id: "SUP-1".into(),
            partner_name: "Acme".into(),
            warehouse_id: "WH-A".into(),
            document_no: String::new(),
            timestamp: String::new(),
            note: String::new(),
            tenant_id: TenantId::from("mgr-1"),
        }
    }

    #[test]
    fn append_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::open(dir.path(), u64::MAX).unwrap();

        wal.append(&TenantId::from("mgr-1"), &event("T1")).unwrap();
        wal.append(&TenantId::from("mgr-1"), &event("T2")).unwrap();

        let content = fs::read_to_string(wal.active_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('|').count(), codec::FIELD_COUNT);
    }

    #[test]
    fn receipt_timestamp_is_the_first_field() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::open(dir.path(), u64::MAX).unwrap();

        let receipt = wal.append(&TenantId::from("mgr-1"), &event("T1")).unwrap();
        let content = fs::read_to_string(wal.active_path()).unwrap();
        assert!(content.starts_with(&receipt));
    }

    #[test]
    fn oversized_segment_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::open(dir.path(), 64).unwrap();

        // Each line is well over 64 bytes, so every append rotates.
        wal.append(&TenantId::from("mgr-1"), &event("T1")).unwrap();
        wal.append(&TenantId::from("mgr-1"), &event("T2")).unwrap();

        let rotated = WriteAheadLog::rotated_segments(dir.path()).unwrap();
        assert_eq!(rotated.len(), 2);
        assert_eq!(wal.active_len(), 0);
    }

    #[test]
    fn replay_order_puts_active_segment_last() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::open(dir.path(), 64).unwrap();
        wal.append(&TenantId::from("mgr-1"), &event("T1")).unwrap();
        wal.append(&TenantId::from("mgr-1"), &event("T2")).unwrap();

        let order = WriteAheadLog::replay_order(dir.path()).unwrap();
        assert_eq!(order.last().unwrap(), &wal.active_path());
        assert!(order.len() >= 3);
    }

    #[test]
    fn reopen_resumes_at_existing_length() {
        let dir = tempfile::tempdir().unwrap();
        {
            let wal = WriteAheadLog::open(dir.path(), u64::MAX).unwrap();
            wal.append(&TenantId::from("mgr-1"), &event("T1")).unwrap();
        }
        let wal = WriteAheadLog::open(dir.path(), u64::MAX).unwrap();
        assert!(wal.active_len() > 0);
    }
}
