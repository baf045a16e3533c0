//! Directory-based content cache.
//!
//! Each cache slot is one file named after the hashed bucket of its key.
//! The file starts with the full key and a NUL byte, followed by the cached
//! payload. Writers fill a `.lock` staging file under an exclusive advisory
//! lock and rename it into place, so readers only ever see complete slots.

pub mod engine;
pub mod hash;
pub mod listing;
pub mod lock;
pub mod prune;
pub mod slot;

pub use engine::{process, ContentCache, FallbackReason, Outcome, StaleReason};
pub use hash::{bucket_id, bucket_index, hash_key};
pub use listing::{list_slots, write_listing, SlotEntry};
pub use lock::{LockAttempt, StagingLock};
pub use prune::{prune, PruneReport};
pub use slot::{FileIdentity, OpenSlot, SlotPaths, Ttl};

/// Get the default cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("/var/cache/slotcache")
}
