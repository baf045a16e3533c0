//! Shell completions generation.
//!
//! `slotcache completions <shell>` writes a completion script covering every
//! subcommand and global flag to the output sink.

use std::io::Write;

use crate::cli::args::{Cli, CompletionsArgs};
use crate::error::Result;
use clap::CommandFactory;

use super::dispatcher::{Command, CommandResult};

/// The completions command implementation.
pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    /// Create a new completions command.
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }
}

impl Command for CompletionsCommand {
    fn execute<W: Write>(&self, out: &mut W) -> Result<CommandResult> {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        clap_complete::generate(self.args.shell, &mut cmd, bin_name, out);
        Ok(CommandResult::success())
    }
}
