//! Main entry point for the qec CLI.
//!
//! Merges the compose files given with `-f` and runs docker compose against
//! the result:
//! - `up`: Create and start the merged project (default)
//! - `down`, `config`, `ps`, `logs`: The matching docker compose commands
//! - `merge`: Print the merged compose file
//! - `completions`: Generate shell completion scripts
//!
//! Any other command is passed through to docker compose.

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::{Cli, Command};
use commands::UpCommand;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    let global = GlobalOptions {
        files: cli.files,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        quiet: cli.quiet,
        offset: cli.offset,
        data_dir: cli.data_dir,
    };

    // Execute the command
    let result = match cli.command.unwrap_or_else(|| Command::Up(UpCommand::default())) {
        Command::Up(cmd) => cmd.execute(&global),
        Command::Down(cmd) => cmd.execute(qec::ComposeCommand::Down, &global),
        Command::Config(cmd) => cmd.execute(qec::ComposeCommand::Config, &global),
        Command::Ps(cmd) => cmd.execute(qec::ComposeCommand::Ps, &global),
        Command::Logs(cmd) => cmd.execute(qec::ComposeCommand::Logs, &global),
        Command::Merge(cmd) => cmd.execute(&global),
        Command::Completions(cmd) => cmd.execute(&global),
        Command::External(args) => commands::compose::execute_external(args, &global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
