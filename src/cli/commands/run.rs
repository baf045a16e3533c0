//! Run command implementation.
//!
//! `slotcache run --key K -- cmd args...` serves `cmd`'s stdout through the
//! cache. The command is only executed when the slot is missing, expired or
//! cannot be used.

use std::io::{self, Write};
use std::process::{self, Stdio};

use crate::cache::{ContentCache, Ttl};
use crate::cli::args::RunArgs;
use crate::config::{CacheConfig, TtlClass};
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    config: CacheConfig,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(config: &CacheConfig, args: RunArgs) -> Self {
        Self {
            config: config.clone(),
            args,
        }
    }

    /// TTL for this request: `--ttl`, else the `--class` entry, else the
    /// table's dynamic TTL.
    pub fn ttl(&self) -> Ttl {
        let minutes = self.args.ttl.unwrap_or_else(|| {
            self.config
                .ttl
                .minutes(self.args.class.unwrap_or(TtlClass::Dynamic))
        });
        Ttl::from_minutes(minutes)
    }
}

impl Command for RunCommand {
    fn execute<W: Write>(&self, out: &mut W) -> Result<CommandResult> {
        let cache = ContentCache::from_config(&self.config);
        let key = self.args.cache_key();

        let outcome = cache.process(Some(key.as_bytes()), self.ttl(), out, |sink| {
            run_generator(&self.args.command, sink)
        })?;
        out.flush()?;

        tracing::debug!(
            "Key {:?} served: {:?} (generated: {})",
            key,
            outcome,
            outcome.generated()
        );
        Ok(CommandResult::success())
    }
}

/// Run `argv` and copy its stdout into `sink`. A non-zero exit is an error,
/// so a failed command is never committed to the cache.
fn run_generator(argv: &[String], sink: &mut dyn Write) -> io::Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no command given"))?;

    let mut child = process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
    let copied = io::copy(&mut stdout, sink);
    // Close our end first so a child blocked on a full pipe sees EPIPE.
    drop(stdout);
    let status = child.wait()?;
    copied?;

    if !status.success() {
        return Err(io::Error::other(format!("`{}` exited with {}", program, status)));
    }
    Ok(())
}
