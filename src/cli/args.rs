//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::TtlClass;

/// slotcache - File-per-key content cache.
#[derive(Debug, Parser)]
#[command(name = "slotcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true, env = "SLOTCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides config)
    #[arg(short, long, global = true, env = "SLOTCACHE_ROOT")]
    pub root: Option<PathBuf>,

    /// Number of cache buckets; 0 disables caching (overrides config)
    #[arg(
        short,
        long,
        global = true,
        env = "SLOTCACHE_SIZE",
        allow_negative_numbers = true
    )]
    pub size: Option<i64>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve a command's output through the cache
    Run(RunArgs),

    /// List cache slots
    Ls(LsArgs),

    /// Remove old slots and abandoned staging files
    Prune(PruneArgs),

    /// Show which slot a key maps to
    Hash(HashArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Cache key (defaults to the command line joined by spaces)
    #[arg(short, long)]
    pub key: Option<String>,

    /// TTL in minutes; negative never expires, 0 bypasses the cache
    #[arg(short, long, allow_negative_numbers = true, conflicts_with = "class")]
    pub ttl: Option<i64>,

    /// Take the TTL from this class in the config's TTL table
    #[arg(long, value_enum)]
    pub class: Option<TtlClass>,

    /// Command whose stdout is the cached payload
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

impl RunArgs {
    /// The cache key for this invocation.
    pub fn cache_key(&self) -> String {
        self.key.clone().unwrap_or_else(|| self.command.join(" "))
    }
}

/// Arguments for the `ls` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `prune` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PruneArgs {
    /// Remove slots not rewritten for this many minutes
    #[arg(long, default_value_t = 60 * 24)]
    pub max_age_minutes: u64,
}

/// Arguments for the `hash` command.
#[derive(Debug, Clone, clap::Args)]
pub struct HashArgs {
    /// Cache key to resolve
    #[arg(short, long, default_value = "")]
    pub key: String,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
