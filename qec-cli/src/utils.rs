//! Utility functions for CLI operations.
//!
//! This module provides the steps shared by every command that touches
//! compose files: locating the working directory, loading settings, and
//! loading and merging the documents.

use crate::error::CliError;
use qec::path::normalize::normalize;
use qec::settings::{Settings, SettingsBuilder};
use qec::{init_logger, ConfigMerger, DocumentLoader, Logger, MergeOutcome};
use std::path::{Path, PathBuf};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Compose files, in merge order.
    pub files: Vec<PathBuf>,

    /// Report instead of writing files or running docker compose.
    pub dry_run: bool,

    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Port offset override.
    pub offset: Option<u16>,

    /// Override the user settings directory.
    pub data_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// The logger selected by `--verbose` / `--quiet`.
    pub fn logger(&self) -> Logger {
        init_logger(self.verbose, self.quiet)
    }
}

/// A merged project together with where it should run.
pub struct PreparedProject {
    /// The merge result.
    pub outcome: MergeOutcome,
    /// Effective settings.
    pub settings: Settings,
    /// Directory of the first compose file.
    pub working_dir: PathBuf,
    /// The first compose file, absolute.
    pub first_file: PathBuf,
}

/// Resolve the compose files to absolute paths.
///
/// # Errors
///
/// Returns `InvalidArguments` if no file was given.
pub fn resolve_files(global: &GlobalOptions) -> Result<Vec<PathBuf>, CliError> {
    if global.files.is_empty() {
        return Err(CliError::InvalidArguments(
            "at least one compose file must be specified with -f".to_string(),
        ));
    }
    global
        .files
        .iter()
        .map(|f| normalize(f).map_err(CliError::from))
        .collect()
}

/// The directory holding `first_file`.
pub fn working_dir(first_file: &Path) -> Result<PathBuf, CliError> {
    first_file
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            CliError::InvalidArguments(format!(
                "compose file {} has no parent directory",
                first_file.display()
            ))
        })
}

/// Load layered settings, with `--offset` on top.
pub fn load_settings(global: &GlobalOptions, working_dir: &Path) -> Result<Settings, CliError> {
    let mut builder = SettingsBuilder::new().with_working_dir(working_dir);
    if let Some(ref data_dir) = global.data_dir {
        builder = builder.with_data_dir(data_dir);
    }
    if let Some(offset) = global.offset {
        builder = builder.with_settings(Settings {
            port_offset: Some(offset),
            ..Settings::default()
        });
    }

    builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Load every compose file, merge them and log what the merge did.
pub fn prepare_project(global: &GlobalOptions, logger: &Logger) -> Result<PreparedProject, CliError> {
    let files = resolve_files(global)?;
    let first_file = files[0].clone();
    let working_dir = working_dir(&first_file)?;
    let settings = load_settings(global, &working_dir)?;

    let loader = DocumentLoader::new().with_dotenv(settings.load_dotenv());
    let documents = files
        .iter()
        .map(|f| loader.load(f))
        .collect::<Result<Vec<_>, _>>()?;
    logger.debug(&format!("loaded {} compose file(s)", documents.len()));

    let outcome = ConfigMerger::new(settings.merge_options()).merge(documents)?;
    logger.report(&outcome.report);
    logger.info(&format!(
        "merged {} service(s) from {} file(s)",
        outcome.project.services().len(),
        files.len()
    ));

    Ok(PreparedProject {
        outcome,
        settings,
        working_dir,
        first_file,
    })
}
