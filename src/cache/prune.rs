//! Offline cleanup of a cache directory.
//!
//! The engine never deletes slots on its own; expired content is simply
//! regenerated on the next lookup. Pruning reclaims space from slots nobody
//! asks for anymore and from staging files left behind by writers that died
//! mid-fill.

use std::fs::{self, OpenOptions, TryLockError};
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use super::hash::is_bucket_name;
use super::lock::still_linked;
use super::slot::{age, STAGING_SUFFIX};
use crate::error::{CacheError, Result};

/// What a prune pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Canonical slot files removed for being older than the cutoff.
    pub slots_removed: usize,
    /// Orphaned staging files removed.
    pub locks_removed: usize,
    /// Bytes reclaimed across both.
    pub bytes_freed: u64,
}

/// Remove slots last written more than `max_age` before `now`, and staging
/// files no writer holds a lock on.
///
/// Locked staging files are left alone. Failures on individual files are
/// logged and skipped.
///
/// # Errors
///
/// Returns [`CacheError::RootUnreadable`] if `root` cannot be read.
pub fn prune(root: &Path, max_age: Duration, now: SystemTime) -> Result<PruneReport> {
    let dir = fs::read_dir(root).map_err(|source| CacheError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut report = PruneReport::default();
    for dirent in dir.flatten() {
        let file_name = dirent.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let path = dirent.path();

        if is_bucket_name(name) {
            if let Some(bytes) = prune_slot(&path, max_age, now) {
                report.slots_removed += 1;
                report.bytes_freed += bytes;
            }
        } else if name
            .strip_suffix(STAGING_SUFFIX)
            .is_some_and(is_bucket_name)
        {
            if let Some(bytes) = prune_staging(&path) {
                report.locks_removed += 1;
                report.bytes_freed += bytes;
            }
        }
    }

    tracing::info!(
        "Pruned {} slots and {} staging files from {} ({} bytes)",
        report.slots_removed,
        report.locks_removed,
        root.display(),
        report.bytes_freed
    );
    Ok(report)
}

fn prune_slot(path: &Path, max_age: Duration, now: SystemTime) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    if age(modified, now) <= max_age {
        return None;
    }

    match fs::remove_file(path) {
        Ok(()) => Some(meta.len()),
        Err(e) => {
            tracing::warn!("Unable to remove slot {}: {}", path.display(), e);
            None
        }
    }
}

/// Remove a staging file only while holding its lock, so an active writer's
/// file is never deleted out from under it.
fn prune_staging(path: &Path) -> Option<u64> {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Unable to open staging file {}: {}", path.display(), e);
            return None;
        }
    };

    match file.try_lock() {
        Ok(()) => {}
        Err(TryLockError::WouldBlock) => {
            tracing::debug!("Staging file {} is in use", path.display());
            return None;
        }
        Err(TryLockError::Error(e)) => {
            tracing::warn!("Unable to lock staging file {}: {}", path.display(), e);
            return None;
        }
    }

    if !still_linked(&file, path).unwrap_or(false) {
        return None;
    }

    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    match fs::remove_file(path) {
        Ok(()) => Some(len),
        Err(e) => {
            tracing::warn!("Unable to remove staging file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::lock::{LockAttempt, StagingLock};
    use tempfile::TempDir;

    fn backdate(path: &Path, by: Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn removes_only_old_slots() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("00000000");
        let fresh = temp.path().join("10000000");
        fs::write(&old, b"old\0xxxx").unwrap();
        fs::write(&fresh, b"new\0yy").unwrap();
        backdate(&old, Duration::from_secs(3600));

        let report = prune(temp.path(), Duration::from_secs(600), SystemTime::now()).unwrap();

        assert_eq!(report.slots_removed, 1);
        assert_eq!(report.bytes_freed, 8);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn removes_orphaned_staging_files() {
        let temp = TempDir::new().unwrap();
        let orphan = temp.path().join("00000000.lock");
        fs::write(&orphan, b"key\0half").unwrap();

        let report = prune(temp.path(), Duration::MAX, SystemTime::now()).unwrap();

        assert_eq!(report.locks_removed, 1);
        assert!(!orphan.exists());
    }

    #[test]
    fn keeps_locked_staging_files() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("00000000.lock");
        let held = StagingLock::acquire(&staging, b"key").unwrap();
        assert!(matches!(held, LockAttempt::Acquired(_)));

        let report = prune(temp.path(), Duration::MAX, SystemTime::now()).unwrap();

        assert_eq!(report.locks_removed, 0);
        assert!(staging.exists());
    }

    #[test]
    fn ignores_unrelated_files() {
        let temp = TempDir::new().unwrap();
        let other = temp.path().join("notes.lock");
        fs::write(&other, b"x").unwrap();

        let report = prune(temp.path(), Duration::ZERO, SystemTime::now()).unwrap();

        assert_eq!(report, PruneReport::default());
        assert!(other.exists());
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = prune(&temp.path().join("gone"), Duration::ZERO, SystemTime::now()).unwrap_err();
        assert!(matches!(err, CacheError::RootUnreadable { .. }));
    }
}
