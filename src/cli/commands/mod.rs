//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands write
//! their results to the sink they are given; logs go to stderr.

pub mod completions;
pub mod dispatcher;
pub mod hash;
pub mod ls;
pub mod prune;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
