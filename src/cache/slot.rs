//! Slot addressing, slot file inspection and TTL policy.
//!
//! A slot file holds `key || 0x00 || payload`. Readers only ever open the
//! canonical path; writers fill `<canonical>.lock` and rename it into place.

use std::fs::{self, File, Metadata};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::hash::{bucket_id, bucket_index};

/// Number of leading bytes read from a slot to find its key header.
pub const PREFIX_LEN: usize = 4 * 1024;

/// Suffix appended to the canonical path to form the staging path.
pub const STAGING_SUFFIX: &str = ".lock";

/// The on-disk locations for one cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPaths {
    /// 8-hex-digit bucket id, also the canonical file name.
    pub bucket: String,
    /// File readers open.
    pub canonical: PathBuf,
    /// File a writer fills before publishing it.
    pub staging: PathBuf,
}

impl SlotPaths {
    /// Resolve the slot for `key` in a cache of `capacity` buckets.
    pub fn resolve(root: &Path, key: &[u8], capacity: u32) -> Self {
        let bucket = bucket_id(bucket_index(key, capacity));
        let canonical = root.join(&bucket);
        Self {
            staging: staging_path(&canonical),
            canonical,
            bucket,
        }
    }
}

/// `<canonical>.lock`
pub fn staging_path(canonical: &Path) -> PathBuf {
    let mut name = canonical.as_os_str().to_os_string();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// Freshness policy for a single lookup.
///
/// TTL belongs to the request, not the stored slot: the same file may be
/// fresh for one caller and expired for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Caching is bypassed entirely.
    Disabled,
    /// Content never expires.
    Never,
    /// Content expires this many minutes after its last write.
    Minutes(u64),
}

impl Ttl {
    /// Map the conventional integer form: `0` disables caching, negative
    /// values never expire, positive values are minutes.
    pub fn from_minutes(minutes: i64) -> Self {
        match minutes {
            0 => Self::Disabled,
            m if m < 0 => Self::Never,
            m => Self::Minutes(m.unsigned_abs()),
        }
    }

    /// Whether content last written at `modified` is expired at `now`.
    ///
    /// Compared in whole seconds: expired when `modified + minutes*60 < now`.
    pub fn is_expired(self, modified: SystemTime, now: SystemTime) -> bool {
        match self {
            Self::Never => false,
            // Disabled lookups never reach a slot.
            Self::Disabled => true,
            Self::Minutes(minutes) => {
                let ttl_secs = minutes.saturating_mul(60);
                unix_seconds(modified).saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
                    < unix_seconds(now)
            }
        }
    }
}

/// Seconds since the epoch, negative for times before it.
pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

/// Identity of a slot file as observed at open time.
///
/// A change in any field after the fact means the canonical path was
/// replaced (or rewritten) by another process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    /// Inode number (always 0 on platforms without one).
    pub ino: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// File size in bytes.
    pub len: u64,
}

impl FileIdentity {
    /// Capture identity from file metadata.
    pub fn from_metadata(meta: &Metadata) -> io::Result<Self> {
        Ok(Self {
            ino: inode(meta),
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

#[cfg(unix)]
fn inode(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn inode(_meta: &Metadata) -> u64 {
    0
}

/// A canonical slot file opened for reading.
#[derive(Debug)]
pub struct OpenSlot {
    file: File,
    prefix: Vec<u8>,
    identity: FileIdentity,
}

impl OpenSlot {
    /// Open `path` read-only, capture its identity and buffer the first
    /// [`PREFIX_LEN`] bytes.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let identity = FileIdentity::from_metadata(&file.metadata()?)?;

        let mut prefix = Vec::with_capacity(PREFIX_LEN);
        (&file).take(PREFIX_LEN as u64).read_to_end(&mut prefix)?;

        Ok(Self {
            file,
            prefix,
            identity,
        })
    }

    /// Bytes before the first NUL in the buffered prefix.
    ///
    /// `None` if the prefix has no NUL: the file is malformed or its key is
    /// longer than the prefix, and it can never match a lookup.
    pub fn stored_key(&self) -> Option<&[u8]> {
        let nul = self.prefix.iter().position(|&b| b == 0)?;
        Some(&self.prefix[..nul])
    }

    /// The raw buffered prefix.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Whether this slot holds `key`.
    pub fn matches(&self, key: &[u8]) -> bool {
        self.stored_key() == Some(key)
    }

    /// Metadata captured at open time.
    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    /// Re-stat `canonical` and report whether it no longer matches what was
    /// opened. A failed stat counts as replaced.
    pub fn was_replaced(&self, canonical: &Path) -> bool {
        match fs::metadata(canonical).and_then(|meta| FileIdentity::from_metadata(&meta)) {
            Ok(current) => current != self.identity,
            Err(_) => true,
        }
    }

    /// Give up the slot and keep only its file handle.
    pub fn into_file(self) -> File {
        self.file
    }
}

/// Copy everything after the `key || 0x00` header of `file` into `out`.
///
/// `io::copy` uses `copy_file_range`/`sendfile` on Linux when `out` is a file,
/// pipe or socket, and retries interrupted reads and writes.
pub fn serve_payload<W: Write>(file: &mut File, key_len: usize, out: &mut W) -> io::Result<u64> {
    file.seek(SeekFrom::Start(key_len as u64 + 1))?;
    io::copy(file, out)
}

/// Age of a file modified at `modified`, zero if it lies in the future.
pub fn age(modified: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_slot(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn resolve_builds_canonical_and_staging_paths() {
        let paths = SlotPaths::resolve(Path::new("/var/cache/slotcache"), b"", 1);

        assert_eq!(paths.bucket, "00000000");
        assert_eq!(
            paths.canonical,
            PathBuf::from("/var/cache/slotcache/00000000")
        );
        assert_eq!(
            paths.staging,
            PathBuf::from("/var/cache/slotcache/00000000.lock")
        );
    }

    #[test]
    fn resolve_is_deterministic() {
        let root = Path::new("/cache");
        assert_eq!(
            SlotPaths::resolve(root, b"/repo/tree", 997),
            SlotPaths::resolve(root, b"/repo/tree", 997)
        );
    }

    #[test]
    fn ttl_from_minutes() {
        assert_eq!(Ttl::from_minutes(0), Ttl::Disabled);
        assert_eq!(Ttl::from_minutes(-1), Ttl::Never);
        assert_eq!(Ttl::from_minutes(-30), Ttl::Never);
        assert_eq!(Ttl::from_minutes(5), Ttl::Minutes(5));
    }

    #[test]
    fn one_minute_ttl_boundary() {
        let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let ttl = Ttl::Minutes(1);

        assert!(!ttl.is_expired(written, written + Duration::from_secs(59)));
        assert!(!ttl.is_expired(written, written + Duration::from_secs(60)));
        assert!(ttl.is_expired(written, written + Duration::from_secs(61)));
    }

    #[test]
    fn negative_ttl_never_expires() {
        let written = SystemTime::UNIX_EPOCH;
        let now = written + Duration::from_secs(10 * 365 * 24 * 3600);
        assert!(!Ttl::Never.is_expired(written, now));
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let now = SystemTime::now();
        assert!(!Ttl::Minutes(u64::MAX).is_expired(now, now));
    }

    #[test]
    fn open_slot_reads_key_header() {
        let dir = TempDir::new().unwrap();
        let path = write_slot(&dir, "00000000", b"my-key\0payload");

        let slot = OpenSlot::open(&path).unwrap();
        assert_eq!(slot.stored_key(), Some(&b"my-key"[..]));
        assert!(slot.matches(b"my-key"));
        assert!(!slot.matches(b"my-ke"));
        assert!(!slot.matches(b"my-key2"));
        assert_eq!(slot.identity().len, 14);
    }

    #[test]
    fn slot_without_nul_never_matches() {
        let dir = TempDir::new().unwrap();
        let path = write_slot(&dir, "00000000", b"no header here");

        let slot = OpenSlot::open(&path).unwrap();
        assert_eq!(slot.stored_key(), None);
        assert!(!slot.matches(b"no header here"));
    }

    #[test]
    fn key_longer_than_prefix_never_matches() {
        let dir = TempDir::new().unwrap();
        let key = vec![b'k'; PREFIX_LEN];
        let mut contents = key.clone();
        contents.push(0);
        contents.extend_from_slice(b"payload");
        let path = write_slot(&dir, "00000000", &contents);

        let slot = OpenSlot::open(&path).unwrap();
        assert!(!slot.matches(&key));
    }

    #[test]
    fn empty_key_is_distinct_from_nul_key() {
        let dir = TempDir::new().unwrap();
        let path = write_slot(&dir, "00000000", b"\0payload");

        let slot = OpenSlot::open(&path).unwrap();
        assert!(slot.matches(b""));
        assert!(!slot.matches(b"\0"));
    }

    #[test]
    fn serve_payload_skips_header() {
        let dir = TempDir::new().unwrap();
        let path = write_slot(&dir, "00000000", b"key\0hello world");

        let mut file = OpenSlot::open(&path).unwrap().into_file();
        let mut out = Vec::new();
        let copied = serve_payload(&mut file, 3, &mut out).unwrap();

        assert_eq!(out, b"hello world");
        assert_eq!(copied, 11);
    }

    #[test]
    fn replacement_is_detected() {
        let dir = TempDir::new().unwrap();
        let path = write_slot(&dir, "00000000", b"key\0old");
        let slot = OpenSlot::open(&path).unwrap();
        assert!(!slot.was_replaced(&path));

        let replacement = write_slot(&dir, "00000000.lock", b"key\0new content");
        fs::rename(&replacement, &path).unwrap();
        assert!(slot.was_replaced(&path));
    }

    #[test]
    fn missing_canonical_counts_as_replaced() {
        let dir = TempDir::new().unwrap();
        let path = write_slot(&dir, "00000000", b"key\0old");
        let slot = OpenSlot::open(&path).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(slot.was_replaced(&path));
    }
}
