//! slotcache - a directory-based, file-per-key content cache.
//!
//! slotcache stores the output of expensive operations in hashed slot files
//! and serves stale-but-available content safely under concurrent access
//! from many processes. Slots are replaced atomically, expire by TTL, and any
//! failure degrades to running the operation uncached.
//!
//! # Modules
//!
//! - [`cache`] - Slot resolution, the lookup/fill engine, listing and pruning
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use slotcache::cache::{ContentCache, Outcome, Ttl};
//! use std::io::Write;
//! use tempfile::TempDir;
//!
//! let dir = TempDir::new().unwrap();
//! let cache = ContentCache::new(dir.path(), 64);
//!
//! let mut out = Vec::new();
//! let outcome = cache
//!     .process(Some(b"/repo/log"), Ttl::Minutes(5), &mut out, |sink: &mut dyn Write| {
//!         sink.write_all(b"expensive output")
//!     })
//!     .unwrap();
//! assert_eq!(outcome, Outcome::Filled);
//! assert_eq!(out, b"expensive output");
//!
//! // The second lookup is served from the slot without regenerating.
//! let mut again = Vec::new();
//! let outcome = cache
//!     .process(Some(b"/repo/log"), Ttl::Minutes(5), &mut again, |_sink: &mut dyn Write| {
//!         unreachable!("served from cache")
//!     })
//!     .unwrap();
//! assert_eq!(outcome, Outcome::Hit);
//! assert_eq!(again, b"expensive output");
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;

pub use error::{CacheError, Result};
