//! Hash command implementation.
//!
//! Shows where a key would be stored, for debugging collisions.

use std::io::Write;

use crate::cache::{hash_key, ContentCache};
use crate::cli::args::HashArgs;
use crate::config::CacheConfig;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The hash command implementation.
pub struct HashCommand {
    config: CacheConfig,
    args: HashArgs,
}

impl HashCommand {
    /// Create a new hash command.
    pub fn new(config: &CacheConfig, args: HashArgs) -> Self {
        Self {
            config: config.clone(),
            args,
        }
    }
}

impl Command for HashCommand {
    fn execute<W: Write>(&self, out: &mut W) -> Result<CommandResult> {
        let key = self.args.key.as_bytes();
        writeln!(out, "hash     {:08x}", hash_key(key))?;

        let Some(paths) = ContentCache::from_config(&self.config).slot_paths(key) else {
            writeln!(out, "caching disabled (size {})", self.config.size)?;
            return Ok(CommandResult::failure(1));
        };

        writeln!(out, "bucket   {}", paths.bucket)?;
        writeln!(out, "slot     {}", paths.canonical.display())?;
        writeln!(out, "staging  {}", paths.staging.display())?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn prints_slot_location() {
        let config = CacheConfig {
            root: PathBuf::from("/cache"),
            size: 1,
            ..CacheConfig::default()
        };
        let mut out = Vec::new();
        let result = HashCommand::new(&config, HashArgs { key: String::new() })
            .execute(&mut out)
            .unwrap();

        assert!(result.success);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                "hash     811c9dc5\n",
                "bucket   00000000\n",
                "slot     /cache/00000000\n",
                "staging  /cache/00000000.lock\n",
            )
        );
    }

    #[test]
    fn disabled_cache_is_reported() {
        let mut out = Vec::new();
        let result = HashCommand::new(&CacheConfig::default(), HashArgs { key: "k".into() })
            .execute(&mut out)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(String::from_utf8(out).unwrap().contains("caching disabled"));
    }
}
