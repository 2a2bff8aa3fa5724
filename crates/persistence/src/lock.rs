//! Advisory data-directory lock.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{PersistenceError, PersistenceResult};

pub const LOCK_FILE: &str = ".lock";

/// Exclusive advisory lock on a data directory.
///
/// Held for the owner's lifetime; a second process (or a second manager in
/// the same process) pointed at the same directory fails to acquire it.
/// The OS releases the lock when the file handle is dropped.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    pub fn acquire(data_dir: &Path) -> PersistenceResult<Self> {
        let path = data_dir.join(LOCK_FILE);
        let file = File::create(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| PersistenceError::LockHeld(path.display().to_string()))?;

        let mut lock = Self { file, path };
        // Record the holder's pid for operators; purely informational.
        let _ = writeln!(lock.file, "{}", std::process::id());

        debug!(path = %lock.path.display(), "data directory lock acquired");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();

        let first = DirLock::acquire(dir.path()).unwrap();
        assert!(matches!(
            DirLock::acquire(dir.path()),
            Err(PersistenceError::LockHeld(_))
        ));

        drop(first);
        assert!(DirLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn lock_file_lands_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirLock::acquire(dir.path()).unwrap();
        assert_eq!(lock.path(), dir.path().join(LOCK_FILE));
        assert!(lock.path().exists());
    }
}
