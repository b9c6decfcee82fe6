//! Running docker compose against a merged project.
//!
//! The [`Executor`] writes the merged project next to the first compose file
//! and invokes docker compose with `-f` pointing at it. Process launching
//! goes through the [`CommandRunner`] trait.

pub mod binary;
pub mod command;

use std::fs;
use std::path::{Path, PathBuf};

pub use binary::{CommandOutput, CommandRunner, ComposeBinary, Invocation, SystemRunner};
pub use command::ComposeCommand;

#[cfg(test)]
pub use binary::MockCommandRunner;

use crate::error::{Error, Result};
use crate::merge::MergedProject;
use crate::settings::schema::DEFAULT_MERGED_FILE;

/// The result of [`Executor::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// The command that ran, or would have run.
    pub command_line: String,
    /// Where the merged compose file lives.
    pub config_path: PathBuf,
    /// Process output; `None` for dry runs.
    pub output: Option<CommandOutput>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Writes a merged project to disk and runs compose commands against it.
///
/// # Examples
///
/// ```
/// use qec::executor::{ComposeCommand, Executor};
/// use qec::merge::MergedProject;
///
/// let dir = tempfile::tempdir().unwrap();
/// let executor = Executor::new(MergedProject::default(), dir.path()).with_dry_run(true);
///
/// let result = executor.execute(&ComposeCommand::Up, &["-d".to_string()]).unwrap();
/// assert!(result.dry_run);
/// assert!(result.command_line.ends_with("up --remove-orphans -d"));
/// assert!(!result.config_path.exists());
/// ```
pub struct Executor {
    project: MergedProject,
    working_dir: PathBuf,
    file_name: String,
    dry_run: bool,
    configured_binary: Option<PathBuf>,
    binary: Option<ComposeBinary>,
    runner: Box<dyn CommandRunner>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("working_dir", &self.working_dir)
            .field("file_name", &self.file_name)
            .field("dry_run", &self.dry_run)
            .field("binary", &self.binary)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// An executor for `project` running in `working_dir`.
    pub fn new(project: MergedProject, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            project,
            working_dir: working_dir.into(),
            file_name: DEFAULT_MERGED_FILE.to_string(),
            dry_run: false,
            configured_binary: None,
            binary: None,
            runner: Box::new(SystemRunner),
        }
    }

    /// Sets the merged file's name within the working directory.
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Enables dry-run mode: nothing is written and nothing is spawned.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Uses `path` instead of searching `PATH` for the compose binary.
    #[must_use]
    pub fn with_configured_binary(mut self, path: Option<PathBuf>) -> Self {
        self.configured_binary = path;
        self
    }

    /// Uses an already located binary.
    #[must_use]
    pub fn with_binary(mut self, binary: ComposeBinary) -> Self {
        self.binary = Some(binary);
        self
    }

    /// Replaces the process runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// The project being executed.
    #[must_use]
    pub fn project(&self) -> &MergedProject {
        &self.project
    }

    /// The directory compose runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Where the merged file is written.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.working_dir.join(&self.file_name)
    }

    /// Writes the merged project, replacing any previous file.
    ///
    /// In dry-run mode the path is returned without writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the project cannot be serialized and
    /// [`Error::Io`] if the file cannot be written.
    pub fn write_config(&self) -> Result<PathBuf> {
        let path = self.config_path();
        if self.dry_run {
            log::debug!("dry run: not writing {}", path.display());
            return Ok(path);
        }

        let yaml = self.project.to_yaml()?;
        fs::write(&path, yaml)?;
        log::debug!("wrote merged compose file {}", path.display());
        Ok(path)
    }

    /// Writes the merged file and runs `command` against it.
    ///
    /// The compose arguments are `-f <merged file> <verb>`, then the verb's
    /// [leading arguments](ComposeCommand::leading_args), then `args`.
    ///
    /// # Errors
    ///
    /// - [`Error::ComposeNotFound`] if no compose binary can be found or
    ///   started.
    /// - [`Error::CommandFailed`] if the process exits unsuccessfully.
    /// - Errors from [`write_config`](Self::write_config).
    pub fn execute(&self, command: &ComposeCommand, args: &[String]) -> Result<ExecutionResult> {
        let config_path = self.write_config()?;
        let compose_args = compose_args(&config_path, command, args);

        if self.dry_run {
            let invocation = self.display_binary().invocation(compose_args, &self.working_dir);
            return Ok(ExecutionResult {
                command_line: invocation.command_line(),
                config_path,
                output: None,
                dry_run: true,
            });
        }

        let binary = self.resolve_binary()?;
        let invocation = binary.invocation(compose_args, &self.working_dir);
        let command_line = invocation.command_line();
        log::info!("running {command_line}");

        let output = self.runner.run(&invocation).map_err(|e| {
            log::debug!("failed to start {}: {e}", invocation.program.display());
            Error::ComposeNotFound
        })?;
        if !output.success() {
            return Err(Error::CommandFailed {
                command: command.name().to_string(),
                exit_code: output.exit_code,
                output: output.output,
            });
        }

        Ok(ExecutionResult {
            command_line,
            config_path,
            output: Some(output),
            dry_run: false,
        })
    }

    fn resolve_binary(&self) -> Result<ComposeBinary> {
        match &self.binary {
            Some(binary) => Ok(binary.clone()),
            None => ComposeBinary::discover(self.configured_binary.as_deref(), None),
        }
    }

    fn display_binary(&self) -> ComposeBinary {
        if let Some(binary) = &self.binary {
            return binary.clone();
        }
        self.configured_binary
            .as_deref()
            .map_or_else(|| ComposeBinary::new("docker", true), ComposeBinary::from_path)
    }
}

fn compose_args(config_path: &Path, command: &ComposeCommand, args: &[String]) -> Vec<String> {
    let mut out = vec![
        "-f".to_string(),
        config_path.display().to_string(),
        command.name().to_string(),
    ];
    out.extend(command.leading_args().iter().map(|a| (*a).to_string()));
    out.extend(args.iter().cloned());
    out
}
