//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{ComposeArgs, CompletionsCommand, MergeCommand, UpCommand};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run several independent Docker Compose projects as one.
#[derive(Parser)]
#[command(name = "qec")]
#[command(
    version,
    about = "Run several Docker Compose projects as one",
    long_about = "Merges compose files from different directories into a single project. \
                  Services and named resources are prefixed with their directory's name, \
                  relative paths are made absolute and colliding host ports are moved by \
                  a fixed offset. Commands other than the built-in ones are passed to \
                  docker compose (for example build, pull, push or restart)."
)]
pub struct Cli {
    /// Compose file to include (repeat for each project)
    #[arg(short = 'f', long = "file", value_name = "FILE", global = true)]
    pub files: Vec<PathBuf>,

    /// Show what would run without writing files or starting docker compose
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Distance between reassigned host ports
    #[arg(long, value_name = "N", global = true)]
    pub offset: Option<u16>,

    /// Override the user settings directory
    #[arg(long, value_name = "PATH", global = true, env = "QEC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create and start the merged project (the default)
    Up(UpCommand),

    /// Stop and remove the merged project's containers
    Down(ComposeArgs),

    /// Validate and print the merged project as docker compose sees it
    Config(ComposeArgs),

    /// List the merged project's containers
    Ps(ComposeArgs),

    /// Show output from the merged project's containers
    Logs(ComposeArgs),

    /// Print the merged compose file without running docker compose
    Merge(MergeCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),

    /// Any other docker compose command
    #[command(external_subcommand)]
    External(Vec<String>),
}
