//! Error types for slotcache operations.
//!
//! This module defines [`CacheError`], the error type returned by the cache
//! engine, the listing and pruning tools, and the config loader, plus a
//! [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - The cache engine recovers from almost every I/O failure by falling back
//!   to uncached generation; only failures that leave the caller without
//!   output surface as `CacheError`
//! - Listing and pruning report a missing or unreadable cache root as
//!   [`CacheError::RootUnreadable`] and skip unreadable entries
//! - Use `anyhow::Error` (via `CacheError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for slotcache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache root directory could not be opened for listing.
    #[error("Unable to open cache root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Explicitly requested config file does not exist.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// The content generator failed while writing straight to the caller.
    #[error("Content generation failed: {0}")]
    Generate(#[source] std::io::Error),

    /// Copying a slot's payload to the output sink failed.
    #[error("Error printing cache {path}: {source}")]
    Serve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for slotcache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
