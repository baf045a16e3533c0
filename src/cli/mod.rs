//! Command-line interface for slotcache.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionsArgs, HashArgs, LsArgs, PruneArgs, RunArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
