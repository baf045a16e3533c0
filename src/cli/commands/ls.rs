//! Ls command implementation.
//!
//! `slotcache ls` prints one line per slot: name, modification time (UTC),
//! size and embedded key.

use std::io::Write;

use crate::cache::{list_slots, write_listing};
use crate::cli::args::LsArgs;
use crate::config::CacheConfig;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The ls command implementation.
pub struct LsCommand {
    config: CacheConfig,
    args: LsArgs,
}

impl LsCommand {
    /// Create a new ls command.
    pub fn new(config: &CacheConfig, args: LsArgs) -> Self {
        Self {
            config: config.clone(),
            args,
        }
    }
}

impl Command for LsCommand {
    fn execute<W: Write>(&self, out: &mut W) -> Result<CommandResult> {
        if self.args.json {
            let entries = list_slots(&self.config.root)?;
            serde_json::to_writer_pretty(&mut *out, &entries).map_err(anyhow::Error::from)?;
            writeln!(out)?;
        } else {
            let count = write_listing(&self.config.root, out)?;
            tracing::debug!("Listed {} slots in {}", count, self.config.root.display());
        }
        Ok(CommandResult::success())
    }
}
