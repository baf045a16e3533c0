//! Read-only listing of a cache directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::hash::is_bucket_name;
use super::slot::OpenSlot;
use crate::error::{CacheError, Result};

/// One canonical slot file as found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotEntry {
    /// Slot file name (the bucket id).
    pub name: String,
    /// Full path to the slot file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// File size in bytes, key header included.
    pub size: u64,
    /// Embedded key, decoded lossily. Without a NUL in the first 4 KiB this
    /// is the whole prefix.
    pub key: String,
}

impl SlotEntry {
    /// Read the entry for the slot file at `path`.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let slot = OpenSlot::open(path)?;
        let key = slot.stored_key().unwrap_or(slot.prefix());

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            modified: DateTime::<Utc>::from(slot.identity().modified),
            size: slot.identity().len,
            key: String::from_utf8_lossy(key).into_owned(),
        })
    }

    /// `name YYYY-MM-DD HH:MM:SS      size key`
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {:>10} {}",
            self.name,
            self.modified.format("%Y-%m-%d %H:%M:%S"),
            self.size,
            self.key
        )
    }
}

/// List every canonical slot in `root`, sorted by name.
///
/// Only 8-character file names are considered, which skips staging files.
/// Entries that cannot be read are logged and skipped.
///
/// # Errors
///
/// Returns [`CacheError::RootUnreadable`] if `root` cannot be read.
pub fn list_slots(root: &Path) -> Result<Vec<SlotEntry>> {
    let dir = fs::read_dir(root).map_err(|source| {
        tracing::warn!("Unable to open path {}: {}", root.display(), source);
        CacheError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        }
    })?;

    let mut entries = Vec::new();
    for dirent in dir {
        let dirent = match dirent {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Unable to read entry in {}: {}", root.display(), e);
                continue;
            }
        };

        let file_name = dirent.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !is_bucket_name(name) {
            continue;
        }

        let path = dirent.path();
        match SlotEntry::read(&path) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!("Unable to open path {}: {}", path.display(), e),
        }
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Write one [`SlotEntry::to_line`] per slot to `out`; returns the count.
pub fn write_listing<W: Write>(root: &Path, out: &mut W) -> Result<usize> {
    let entries = list_slots(root)?;
    for entry in &entries {
        writeln!(out, "{}", entry.to_line())?;
    }
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn lists_only_slot_shaped_names() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("00000000"), b"first\0payload").unwrap();
        fs::write(temp.path().join("a1000000"), b"second\0xy").unwrap();
        fs::write(temp.path().join("a1000000.lock"), b"second\0partial").unwrap();
        fs::write(temp.path().join("README"), b"not a slot").unwrap();

        let entries = list_slots(temp.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["00000000", "a1000000"]);
        assert_eq!(entries[0].key, "first");
        assert_eq!(entries[0].size, 13);
        assert_eq!(entries[1].key, "second");
    }

    #[test]
    fn headerless_slot_reports_prefix() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("00000000"), b"garbage").unwrap();

        let entries = list_slots(temp.path()).unwrap();
        assert_eq!(entries[0].key, "garbage");
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = list_slots(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, CacheError::RootUnreadable { .. }));
    }

    #[test]
    fn empty_root_lists_nothing() {
        let temp = TempDir::new().unwrap();
        let mut out = Vec::new();
        assert_eq!(write_listing(temp.path(), &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn line_format() {
        let entry = SlotEntry {
            name: "a1000000".into(),
            path: PathBuf::from("/cache/a1000000"),
            modified: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
            size: 1234,
            key: "/repo.git/log/".into(),
        };
        insta::assert_snapshot!(
            entry.to_line(),
            @"a1000000 2024-03-09 07:05:01       1234 /repo.git/log/"
        );
    }

    #[test]
    fn serializes_to_json() {
        let entry = SlotEntry {
            name: "00000000".into(),
            path: PathBuf::from("/cache/00000000"),
            modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            size: 3,
            key: "k".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["name"], "00000000");
        assert_eq!(json["size"], 3);
        assert_eq!(json["key"], "k");
    }
}
