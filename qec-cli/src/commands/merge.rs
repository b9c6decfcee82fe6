//! Merge command implementation.
//!
//! Prints the merged compose file without starting docker compose. With
//! `--report` the output is JSON holding the project and the merge events.

use crate::error::CliError;
use crate::utils::{prepare_project, GlobalOptions};
use clap::Args;
use qec::{MergeReport, MergedProject};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// Print the merged compose file.
#[derive(Args, Debug, Default)]
pub struct MergeCommand {
    /// Print JSON with the merged project and every merge event
    #[arg(long)]
    pub report: bool,

    /// Write the merged compose file here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl MergeCommand {
    /// Execute the merge command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let logger = global.logger();
        let prepared = prepare_project(global, &logger)?;
        let project = &prepared.outcome.project;

        let yaml = project.to_yaml()?;
        match self.output {
            Some(ref path) if global.dry_run => {
                logger.info(&format!("Dry run: not writing {}", path.display()));
            }
            Some(ref path) => {
                fs::write(path, &yaml)?;
                logger.info(&format!("Merged configuration written to {}", path.display()));
            }
            None if !self.report => print!("{yaml}"),
            None => {}
        }

        if self.report {
            println!("{}", render_report(project, &prepared.outcome.report)?);
        }
        Ok(())
    }
}

fn render_report(project: &MergedProject, report: &MergeReport) -> Result<String, CliError> {
    let document = json!({
        "project": project,
        "events": report,
    });
    serde_json::to_string_pretty(&document).map_err(|e| CliError::Serialization(e.to_string()))
}
