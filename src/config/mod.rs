//! Configuration loading for slotcache.
//!
//! - Schema definitions in [`schema`]
//! - File loading and command-line overrides in [`loader`]
//!
//! # Example
//!
//! ```
//! use slotcache::config::{parse_config, TtlClass};
//! use std::path::Path;
//!
//! let yaml = "size: 1024\nttl:\n  repo: 10\n";
//! let config = parse_config(yaml, Path::new("slotcache.yml")).unwrap();
//! assert_eq!(config.size, 1024);
//! assert_eq!(config.ttl.minutes(TtlClass::Repo), 10);
//! assert_eq!(config.ttl.minutes(TtlClass::Static), -1);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_file, parse_config};
pub use schema::{CacheConfig, TtlClass, TtlTable};
