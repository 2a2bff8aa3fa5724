//! Point-in-time snapshots of every tenant's event sequence.
//!
//! File format: leading `#` comment lines, then one JSON object per tenant:
//! `{"manager_id":"...","transactions":[...]}`. Snapshots are written to a
//! temp file in the data directory and atomically renamed into place, so a
//! reader never observes a half-written snapshot.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use stockledger_core::TenantId;
use stockledger_events::{MovementEvent, timestamp};

use crate::error::{PersistenceError, PersistenceResult};

const SNAPSHOT_PREFIX: &str = "snapshot_";
const SNAPSHOT_SUFFIX: &str = ".json";

/// One snapshot line: a tenant and its full event sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SnapshotRecord {
    manager_id: TenantId,
    transactions: Vec<MovementEvent>,
}

/// Write a snapshot of `data` and atomically publish it under
/// `snapshot_<stamp>.json`. Returns the published path.
pub fn write_snapshot(
    data_dir: &Path,
    data: &HashMap<TenantId, Vec<MovementEvent>>,
) -> PersistenceResult<PathBuf> {
    let target = data_dir.join(format!(
        "{SNAPSHOT_PREFIX}{}{SNAPSHOT_SUFFIX}",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));

    let mut temp = NamedTempFile::new_in(data_dir)?;
    writeln!(temp, "# Snapshot created at: {}", timestamp::now_utc())?;
    writeln!(temp, "# Format: JSON lines, one tenant per line")?;

    // Sorted tenants keep snapshot output deterministic.
    let mut tenants: Vec<&TenantId> = data.keys().collect();
    tenants.sort();

    for tenant_id in tenants {
        let record = SnapshotRecord {
            manager_id: tenant_id.clone(),
            transactions: data[tenant_id].clone(),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| PersistenceError::Snapshot(e.to_string()))?;
        writeln!(temp, "{line}")?;
    }

    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(&target)
        .map_err(|e| PersistenceError::Snapshot(e.to_string()))?;

    debug!(path = %target.display(), tenants = data.len(), "snapshot written");
    Ok(target)
}

/// Snapshot files in filename-sorted (chronological) order.
pub fn snapshot_files(data_dir: &Path) -> PersistenceResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_SUFFIX) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Load the newest snapshot, if any.
///
/// Comment lines are ignored; a malformed tenant line is skipped with a
/// warning rather than failing the load.
pub fn load_latest(
    data_dir: &Path,
) -> PersistenceResult<HashMap<TenantId, Vec<MovementEvent>>> {
    let mut data = HashMap::new();

    let files = snapshot_files(data_dir)?;
    let Some(latest) = files.last() else {
        return Ok(data);
    };

    let reader = BufReader::new(File::open(latest)?);
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<SnapshotRecord>(&line) {
            Ok(record) => {
                data.insert(record.manager_id, record.transactions);
            }
            Err(e) => {
                warn!(snapshot = %latest.display(), error = %e, "skipping malformed snapshot line");
            }
        }
    }

    debug!(snapshot = %latest.display(), tenants = data.len(), "snapshot loaded");
    Ok(data)
}
