//! Compose commands.
//!
//! Every docker compose verb follows the same steps: merge the compose
//! files, write the merged file next to the first one and run docker compose
//! against it from that directory.

use crate::error::CliError;
use crate::utils::{prepare_project, GlobalOptions};
use clap::Args;
use qec::{ComposeCommand, Executor};

/// Arguments passed to docker compose after the verb.
#[derive(Args, Debug, Default)]
pub struct ComposeArgs {
    /// Extra arguments for docker compose
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl ComposeArgs {
    /// Run `command` with these arguments.
    pub fn execute(self, command: ComposeCommand, global: &GlobalOptions) -> Result<(), CliError> {
        run(command, self.args, global)
    }
}

/// Create and start the merged project.
#[derive(Args, Debug, Default)]
pub struct UpCommand {
    /// Run containers in the background
    #[arg(short, long)]
    pub detach: bool,

    #[command(flatten)]
    pub compose: ComposeArgs,
}

impl UpCommand {
    /// Execute the up command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut args = self.compose.args;
        if self.detach {
            args.push("-d".to_string());
        }
        run(ComposeCommand::Up, args, global)
    }
}

/// Run a verb qec has no dedicated command for.
pub fn execute_external(args: Vec<String>, global: &GlobalOptions) -> Result<(), CliError> {
    let mut args = args.into_iter();
    let verb = args
        .next()
        .ok_or_else(|| CliError::InvalidArguments("missing compose command".to_string()))?;
    let command: ComposeCommand = verb.parse().map_err(CliError::InvalidArguments)?;
    run(command, args.collect(), global)
}

fn run(command: ComposeCommand, args: Vec<String>, global: &GlobalOptions) -> Result<(), CliError> {
    let logger = global.logger();
    let prepared = prepare_project(global, &logger)?;
    let file_name = prepared.settings.merged_file_name_for(&prepared.first_file);

    let executor = Executor::new(prepared.outcome.project, &prepared.working_dir)
        .with_file_name(file_name)
        .with_dry_run(global.dry_run)
        .with_configured_binary(prepared.settings.compose_binary.clone());

    let result = executor.execute(&command, &args)?;

    if result.dry_run {
        println!("{}", result.command_line);
        logger.info(&format!(
            "Dry run: {} was not written and docker compose was not started",
            result.config_path.display()
        ));
        return Ok(());
    }

    logger.info(&format!(
        "Merged configuration written to {}",
        result.config_path.display()
    ));
    if let Some(output) = result.output {
        if command.produces_displayable_output() {
            print!("{}", output.output);
        } else if !output.output.is_empty() {
            logger.debug(output.output.trim_end());
        }
    }
    Ok(())
}
