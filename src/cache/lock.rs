//! Staging file locking, filling and publishing.
//!
//! A writer owns a slot's staging file for as long as it holds a
//! non-blocking exclusive lock on it. Only the lock holder may write the
//! staging file or rename it over the canonical path.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Result of trying to take a staging lock.
#[derive(Debug)]
pub enum LockAttempt {
    /// This process now owns the staging file.
    Acquired(StagingLock),
    /// Another writer holds the lock, or has just published or discarded the
    /// file this attempt opened.
    Busy,
}

/// An exclusively locked staging file with the key header already written.
///
/// Dropping the lock closes the file, which releases the advisory lock but
/// leaves the staging file on disk. Use [`StagingLock::abort`] to remove it.
#[derive(Debug)]
pub struct StagingLock {
    file: File,
    path: PathBuf,
    len: u64,
}

impl StagingLock {
    /// Open or create `path` (owner read/write only) and try to lock it
    /// without blocking. On success the file is truncated and `key || 0x00`
    /// is written so a half-finished fill still names its key.
    pub fn acquire(path: &Path, key: &[u8]) -> io::Result<LockAttempt> {
        let file = open_staging(path)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Ok(LockAttempt::Busy),
            Err(TryLockError::Error(e)) => return Err(e),
        }

        // The handle may point at an inode a previous holder already renamed
        // away or unlinked; locking that is not ownership of the path.
        if !still_linked(&file, path)? {
            return Ok(LockAttempt::Busy);
        }

        let mut lock = Self {
            file,
            path: path.to_path_buf(),
            len: 0,
        };
        if let Err(e) = lock.write_header(key) {
            lock.abort();
            return Err(e);
        }
        Ok(LockAttempt::Acquired(lock))
    }

    fn write_header(&mut self, key: &[u8]) -> io::Result<()> {
        self.file.set_len(0)?;
        let mut file = &self.file;
        file.write_all(key)?;
        file.write_all(&[0])?;
        self.len = key.len() as u64 + 1;
        Ok(())
    }

    /// Path of the staging file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the staging file after the last header write or fill.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True until anything has been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Run `generate` once with the staging file as its sink, flush, and
    /// re-stat the file.
    ///
    /// Any error means the staging content is unusable and the caller must
    /// [`abort`](Self::abort).
    pub fn fill<F>(&mut self, generate: &mut F) -> io::Result<()>
    where
        F: FnMut(&mut dyn Write) -> io::Result<()>,
    {
        let mut writer = BufWriter::new(&self.file);
        generate(&mut writer)?;
        writer.flush()?;
        drop(writer);

        self.len = self.file.metadata()?.len();
        Ok(())
    }

    /// Atomically rename the staging file over `canonical` and return the
    /// still-locked handle for serving.
    ///
    /// The filled content is complete either way, so a failed rename is only
    /// logged: the staging file is removed and the handle is still returned.
    pub fn publish(self, canonical: &Path) -> File {
        if let Err(e) = fs::rename(&self.path, canonical) {
            tracing::warn!(
                "Unable to publish slot {}: {} ({:?})",
                self.path.display(),
                e,
                e.raw_os_error()
            );
            remove_staging(&self.path);
        }
        self.file
    }

    /// Delete the staging file and release the lock.
    pub fn abort(self) {
        remove_staging(&self.path);
    }
}

/// Open `path` read/write, creating it with mode 0600 if absent.
///
/// Never truncates: the file may belong to a writer that holds the lock.
fn open_staging(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Whether `path` still names the file behind `file`.
#[cfg(unix)]
pub(crate) fn still_linked(file: &File, path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(current) => Ok(current.dev() == held.dev() && current.ino() == held.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
pub(crate) fn still_linked(_file: &File, path: &Path) -> io::Result<bool> {
    Ok(path.exists())
}

fn remove_staging(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Unable to remove staging file {}: {}", path.display(), e);
        }
    }
}
