//! Prune command implementation.

use std::io::Write;
use std::time::{Duration, SystemTime};

use crate::cache::prune;
use crate::cli::args::PruneArgs;
use crate::config::CacheConfig;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The prune command implementation.
pub struct PruneCommand {
    config: CacheConfig,
    args: PruneArgs,
}

impl PruneCommand {
    /// Create a new prune command.
    pub fn new(config: &CacheConfig, args: PruneArgs) -> Self {
        Self {
            config: config.clone(),
            args,
        }
    }
}

impl Command for PruneCommand {
    fn execute<W: Write>(&self, out: &mut W) -> Result<CommandResult> {
        let max_age = Duration::from_secs(self.args.max_age_minutes.saturating_mul(60));
        let report = prune(&self.config.root, max_age, SystemTime::now())?;

        writeln!(
            out,
            "Removed {} slots and {} staging files ({} bytes)",
            report.slots_removed, report.locks_removed, report.bytes_freed
        )?;
        Ok(CommandResult::success())
    }
}
