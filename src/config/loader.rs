//! Configuration file loading.
//!
//! Settings are resolved in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. The YAML file named by `--config` / `SLOTCACHE_CONFIG`
//! 3. `--root` / `SLOTCACHE_ROOT` and `--size` / `SLOTCACHE_SIZE`

use crate::config::schema::CacheConfig;
use crate::error::{CacheError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Load a single config file and parse it into [`CacheConfig`].
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParse` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<CacheConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CacheError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CacheError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into [`CacheConfig`].
///
/// An empty document yields the defaults.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_config(content: &str, source_path: &Path) -> Result<CacheConfig> {
    if content.trim().is_empty() {
        return Ok(CacheConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| CacheError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve the effective configuration from an optional file plus
/// command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    root: Option<PathBuf>,
    size: Option<i64>,
) -> Result<CacheConfig> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => CacheConfig::default(),
    };

    if let Some(root) = root {
        config.root = root;
    }
    if let Some(size) = size {
        config.size = size;
    }

    tracing::debug!(
        "Cache root {} with {} buckets",
        config.root.display(),
        config.size
    );
    Ok(config)
}
