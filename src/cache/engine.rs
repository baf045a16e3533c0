//! The lookup/fill protocol.
//!
//! [`ContentCache::process`] serves a key's cached payload, regenerating it
//! when missing, mismatched or expired. It is fail-open: lock contention and
//! cache I/O failures fall back to serving stale content or running the
//! generator straight into the caller's sink.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::lock::{LockAttempt, StagingLock};
use super::slot::{serve_payload, OpenSlot, SlotPaths, Ttl};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Why a request was answered without going through the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Another writer is filling the slot.
    LockBusy,
    /// The staging file could not be created or locked.
    LockFailed,
    /// Generating into the staging file failed.
    FillFailed,
    /// The key contains a NUL byte, which would end the slot header early.
    UnstorableKey,
}

/// Why expired content was served instead of refreshed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Another writer is refreshing the slot.
    LockBusy,
    /// The staging file could not be created or locked.
    LockFailed,
    /// The canonical file changed between open and lock.
    ConcurrentlyReplaced,
    /// Generating into the staging file failed.
    FillFailed,
}

/// Which path a [`ContentCache::process`] call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Caching is off; the generator wrote directly to the sink.
    Disabled,
    /// Fresh content was served from the slot.
    Hit,
    /// The slot was missing or held another key; it was filled and served.
    Filled,
    /// Expired content was regenerated, published and served.
    Refreshed,
    /// Expired content was served as-is.
    Stale(StaleReason),
    /// The generator wrote directly to the sink after the cache failed.
    Uncached(FallbackReason),
}

impl Outcome {
    /// True if the generator ran for this request (at least once).
    pub fn generated(&self) -> bool {
        match self {
            Self::Hit => false,
            Self::Stale(reason) => *reason == StaleReason::FillFailed,
            _ => true,
        }
    }
}

/// A directory of hashed slot files.
///
/// The value is just configuration; every call to [`process`](Self::process)
/// works from the filesystem alone, so separate processes sharing a
/// directory coordinate only through slot files and their locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCache {
    root: Option<PathBuf>,
    capacity: i64,
}

impl ContentCache {
    /// A cache of `capacity` buckets under `root`.
    pub fn new(root: impl Into<PathBuf>, capacity: i64) -> Self {
        Self {
            root: Some(root.into()),
            capacity,
        }
    }

    /// A cache that always runs the generator directly.
    pub fn disabled() -> Self {
        Self {
            root: None,
            capacity: 0,
        }
    }

    /// Build from loaded configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            root: Some(config.root.clone()),
            capacity: config.size,
        }
    }

    /// The cache directory, if one is configured.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Number of buckets.
    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// Resolve the slot `key` would use, or `None` when caching is disabled.
    pub fn slot_paths(&self, key: &[u8]) -> Option<SlotPaths> {
        let root = self.root.as_deref().filter(|r| !r.as_os_str().is_empty())?;
        if self.capacity <= 0 {
            return None;
        }
        let capacity = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        Some(SlotPaths::resolve(root, key, capacity))
    }

    /// Write the payload for `key` to `out`, using the cached slot when it is
    /// fresh and regenerating it with `generate` otherwise.
    ///
    /// `generate` receives the sink it must write to: the staging file while
    /// filling, or `out` itself when the cache is bypassed. It may run twice
    /// for one request if filling fails; only the clean run reaches `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Generate`] if the generator fails while writing
    /// directly to `out`, and [`CacheError::Serve`] if copying a slot to
    /// `out` fails. Cache-side failures are logged and never returned.
    pub fn process<W, F>(
        &self,
        key: Option<&[u8]>,
        ttl: Ttl,
        out: &mut W,
        mut generate: F,
    ) -> Result<Outcome>
    where
        W: Write,
        F: FnMut(&mut dyn Write) -> io::Result<()>,
    {
        let key = key.unwrap_or_default();

        let paths = match self.slot_paths(key) {
            Some(paths) if ttl != Ttl::Disabled => paths,
            _ => {
                if self.capacity > 0 && self.root.is_none() {
                    tracing::debug!("Cache path not specified, caching is disabled");
                }
                run_direct(out, &mut generate)?;
                return Ok(Outcome::Disabled);
            }
        };

        // A stored `a\0b` would read back as key `a`; never open or stage
        // a slot for such a key.
        if key.contains(&0) {
            tracing::debug!("Key \"{}\" contains NUL, generating uncached", key.escape_ascii());
            run_direct(out, &mut generate)?;
            return Ok(Outcome::Uncached(FallbackReason::UnstorableKey));
        }

        match OpenSlot::open(&paths.canonical) {
            Ok(slot) if slot.matches(key) => {
                serve_existing(slot, &paths, key, ttl, out, &mut generate)
            }
            Ok(_) => {
                tracing::debug!("Slot {} holds another key", paths.canonical.display());
                fill_or_bypass(&paths, key, out, &mut generate)
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::debug!("Unable to open slot {}: {}", paths.canonical.display(), e);
                }
                fill_or_bypass(&paths, key, out, &mut generate)
            }
        }
    }
}

/// Serve a slot holding the requested key, refreshing it first if expired.
fn serve_existing<W, F>(
    slot: OpenSlot,
    paths: &SlotPaths,
    key: &[u8],
    ttl: Ttl,
    out: &mut W,
    generate: &mut F,
) -> Result<Outcome>
where
    W: Write,
    F: FnMut(&mut dyn Write) -> io::Result<()>,
{
    let (mut file, outcome) = if ttl.is_expired(slot.identity().modified, SystemTime::now()) {
        match refresh(&slot, paths, key, generate) {
            Ok(file) => (file, Outcome::Refreshed),
            Err(reason) => {
                tracing::debug!("Serving stale slot {}: {:?}", paths.canonical.display(), reason);
                (slot.into_file(), Outcome::Stale(reason))
            }
        }
    } else {
        (slot.into_file(), Outcome::Hit)
    };

    serve(&mut file, key, &paths.canonical, out)?;
    Ok(outcome)
}

/// Regenerate an expired slot. On any failure the caller serves the content
/// it already has open.
fn refresh<F>(
    slot: &OpenSlot,
    paths: &SlotPaths,
    key: &[u8],
    generate: &mut F,
) -> std::result::Result<File, StaleReason>
where
    F: FnMut(&mut dyn Write) -> io::Result<()>,
{
    let mut lock = match StagingLock::acquire(&paths.staging, key) {
        Ok(LockAttempt::Acquired(lock)) => lock,
        Ok(LockAttempt::Busy) => return Err(StaleReason::LockBusy),
        Err(e) => {
            log_lock_failure(&paths.staging, &e);
            return Err(StaleReason::LockFailed);
        }
    };

    // Someone refreshed the slot between our open and our lock. Their content
    // is at least as new as ours; do not overwrite it. The replacement is
    // assumed to hold the same key.
    if slot.was_replaced(&paths.canonical) {
        lock.abort();
        return Err(StaleReason::ConcurrentlyReplaced);
    }

    if let Err(e) = lock.fill(generate) {
        log_fill_failure(lock.path(), &e);
        lock.abort();
        return Err(StaleReason::FillFailed);
    }

    Ok(lock.publish(&paths.canonical))
}

/// Fill an empty or mismatched slot, or run the generator uncached if the
/// slot cannot be filled. There is no old content to fall back to.
fn fill_or_bypass<W, F>(
    paths: &SlotPaths,
    key: &[u8],
    out: &mut W,
    generate: &mut F,
) -> Result<Outcome>
where
    W: Write,
    F: FnMut(&mut dyn Write) -> io::Result<()>,
{
    let mut lock = match StagingLock::acquire(&paths.staging, key) {
        Ok(LockAttempt::Acquired(lock)) => lock,
        Ok(LockAttempt::Busy) => {
            tracing::debug!("Slot {} is locked, generating uncached", paths.staging.display());
            run_direct(out, generate)?;
            return Ok(Outcome::Uncached(FallbackReason::LockBusy));
        }
        Err(e) => {
            log_lock_failure(&paths.staging, &e);
            run_direct(out, generate)?;
            return Ok(Outcome::Uncached(FallbackReason::LockFailed));
        }
    };

    if let Err(e) = lock.fill(generate) {
        log_fill_failure(lock.path(), &e);
        lock.abort();
        run_direct(out, generate)?;
        return Ok(Outcome::Uncached(FallbackReason::FillFailed));
    }

    // Serve from the handle we filled rather than reopening the canonical
    // path, which a concurrent writer for a colliding key may replace.
    let mut file = lock.publish(&paths.canonical);
    serve(&mut file, key, &paths.canonical, out)?;
    Ok(Outcome::Filled)
}

fn run_direct<W, F>(out: &mut W, generate: &mut F) -> Result<()>
where
    W: Write,
    F: FnMut(&mut dyn Write) -> io::Result<()>,
{
    generate(out).map_err(CacheError::Generate)
}

fn serve<W: Write>(file: &mut File, key: &[u8], canonical: &Path, out: &mut W) -> Result<()> {
    serve_payload(file, key.len(), out).map_err(|source| {
        tracing::warn!(
            "Error printing cache {}: {} ({:?})",
            canonical.display(),
            source,
            source.raw_os_error()
        );
        CacheError::Serve {
            path: canonical.to_path_buf(),
            source,
        }
    })?;
    Ok(())
}

fn log_lock_failure(staging: &Path, e: &io::Error) {
    tracing::warn!(
        "Unable to lock slot {}: {} ({:?})",
        staging.display(),
        e,
        e.raw_os_error()
    );
}

fn log_fill_failure(staging: &Path, e: &io::Error) {
    tracing::warn!(
        "Unable to fill slot {}: {} ({:?})",
        staging.display(),
        e,
        e.raw_os_error()
    );
}

/// Single-call form: `capacity <= 0`, `ttl_minutes == 0` or a missing
/// `root` bypass the cache.
pub fn process<W, F>(
    capacity: i64,
    root: Option<&Path>,
    key: Option<&[u8]>,
    ttl_minutes: i64,
    out: &mut W,
    generate: F,
) -> Result<Outcome>
where
    W: Write,
    F: FnMut(&mut dyn Write) -> io::Result<()>,
{
    let cache = match root {
        Some(root) => ContentCache::new(root, capacity),
        None => ContentCache::disabled(),
    };
    cache.process(key, Ttl::from_minutes(ttl_minutes), out, generate)
}
