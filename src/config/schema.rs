//! Configuration schema definitions.
//!
//! This module contains the structs that map to the YAML configuration
//! file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory
    pub root: PathBuf,

    /// Number of buckets; zero or negative disables caching
    pub size: i64,

    /// TTL in minutes per content class
    pub ttl: TtlTable,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: crate::cache::default_cache_dir(),
            size: 0,
            ttl: TtlTable::default(),
        }
    }
}

/// Kinds of cached content, each with its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TtlClass {
    /// Repository index pages
    Root,
    /// Repository summary pages
    Repo,
    /// Pages addressed by a symbolic ref
    Dynamic,
    /// Pages addressed by an object id
    Static,
    /// About pages
    About,
    /// Snapshot archives
    Snapshot,
    /// Scanned repository lists
    Scanrc,
}

/// TTL table in minutes. Negative means never expire, zero disables caching
/// for that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlTable {
    pub root: i64,
    pub repo: i64,
    pub dynamic: i64,
    #[serde(rename = "static")]
    pub static_: i64,
    pub about: i64,
    pub snapshot: i64,
    pub scanrc: i64,
}

impl Default for TtlTable {
    fn default() -> Self {
        Self {
            root: 5,
            repo: 5,
            dynamic: 5,
            static_: -1,
            about: 15,
            snapshot: 5,
            scanrc: 15,
        }
    }
}

impl TtlTable {
    /// TTL in minutes for `class`.
    pub fn minutes(&self, class: TtlClass) -> i64 {
        match class {
            TtlClass::Root => self.root,
            TtlClass::Repo => self.repo,
            TtlClass::Dynamic => self.dynamic,
            TtlClass::Static => self.static_,
            TtlClass::About => self.about,
            TtlClass::Snapshot => self.snapshot,
            TtlClass::Scanrc => self.scanrc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_disables_caching() {
        let config = CacheConfig::default();
        assert_eq!(config.size, 0);
        assert_eq!(config.root, PathBuf::from("/var/cache/slotcache"));
    }

    #[test]
    fn default_ttls() {
        let ttl = TtlTable::default();
        assert_eq!(ttl.minutes(TtlClass::Root), 5);
        assert_eq!(ttl.minutes(TtlClass::Dynamic), 5);
        assert_eq!(ttl.minutes(TtlClass::Static), -1);
        assert_eq!(ttl.minutes(TtlClass::About), 15);
        assert_eq!(ttl.minutes(TtlClass::Scanrc), 15);
    }

    #[test]
    fn partial_ttl_table_keeps_defaults() {
        let ttl: TtlTable = serde_yaml::from_str("static: 60").unwrap();
        assert_eq!(ttl.static_, 60);
        assert_eq!(ttl.repo, 5);
    }

    #[test]
    fn class_names_are_lowercase() {
        let class: TtlClass = serde_yaml::from_str("snapshot").unwrap();
        assert_eq!(class, TtlClass::Snapshot);
    }
}
