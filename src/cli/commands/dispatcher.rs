//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;

use crate::cli::args::{Cli, Commands};
use crate::config::CacheConfig;
use crate::error::Result;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command, writing its output to `out`.
    fn execute<W: Write>(&self, out: &mut W) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config: CacheConfig,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the resolved configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Get the effective configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Dispatch and execute a command.
    pub fn dispatch<W: Write>(&self, cli: &Cli, out: &mut W) -> Result<CommandResult> {
        match &cli.command {
            Commands::Run(args) => {
                super::run::RunCommand::new(&self.config, args.clone()).execute(out)
            }
            Commands::Ls(args) => {
                super::ls::LsCommand::new(&self.config, args.clone()).execute(out)
            }
            Commands::Prune(args) => {
                super::prune::PruneCommand::new(&self.config, args.clone()).execute(out)
            }
            Commands::Hash(args) => {
                super::hash::HashCommand::new(&self.config, args.clone()).execute(out)
            }
            Commands::Completions(args) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn dispatches_ls_to_configured_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("00000000"), b"k\0v").unwrap();

        let config = CacheConfig {
            root: temp.path().to_path_buf(),
            size: 1,
            ..CacheConfig::default()
        };
        let cli = Cli::try_parse_from(["slotcache", "ls"]).unwrap();

        let mut out = Vec::new();
        let result = CommandDispatcher::new(config)
            .dispatch(&cli, &mut out)
            .unwrap();
        assert!(result.success);
        assert!(String::from_utf8(out).unwrap().starts_with("00000000 "));
    }
}
