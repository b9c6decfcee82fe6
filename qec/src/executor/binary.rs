//! Locating and running the docker compose executable.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

const STANDALONE: &str = "docker-compose";
const DOCKER: &str = "docker";

/// A fully specified process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The executable to run.
    pub program: PathBuf,
    /// Arguments, not including the program.
    pub args: Vec<String>,
    /// Directory the process runs in.
    pub working_dir: PathBuf,
}

impl Invocation {
    /// The invocation as a single shell-like line, for logs and dry runs.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Stdout followed by stderr.
    pub output: String,
}

impl CommandOutput {
    /// Whether the process exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs processes on behalf of the executor.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Runs `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started; a
    /// non-zero exit is reported through [`CommandOutput::exit_code`].
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Runs processes with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        log::debug!("executing: {}", invocation.command_line());
        let out = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .output()?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        let exit_code = out.status.code();
        log::debug!("exit code: {exit_code:?}");
        Ok(CommandOutput { exit_code, output })
    }
}

/// The compose executable and how to address it.
///
/// The standalone `docker-compose` takes compose arguments directly; the
/// `docker` CLI needs `compose` in front of them.
///
/// # Examples
///
/// ```
/// use qec::executor::ComposeBinary;
/// use std::path::Path;
///
/// let plugin = ComposeBinary::from_path("/usr/bin/docker");
/// assert!(plugin.is_plugin());
/// let inv = plugin.invocation(vec!["ps".into()], Path::new("/srv"));
/// assert_eq!(inv.args, ["compose", "ps"]);
///
/// let standalone = ComposeBinary::from_path("/usr/local/bin/docker-compose");
/// assert!(!standalone.is_plugin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeBinary {
    executable: PathBuf,
    plugin: bool,
}

impl ComposeBinary {
    /// A binary with an explicit plugin flag.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>, plugin: bool) -> Self {
        Self {
            executable: executable.into(),
            plugin,
        }
    }

    /// A binary whose mode is inferred from its file name: anything not
    /// named `docker-compose` is treated as the docker CLI.
    #[must_use]
    pub fn from_path(executable: impl Into<PathBuf>) -> Self {
        let executable = executable.into();
        let plugin = executable
            .file_stem()
            .and_then(OsStr::to_str)
            .map_or(true, |stem| stem != STANDALONE);
        Self { executable, plugin }
    }

    /// Finds the compose binary.
    ///
    /// A configured path wins. Otherwise `docker-compose` is searched for on
    /// `search_path` (the `PATH` variable when `None`), then `docker`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ComposeNotFound`] if neither executable exists.
    pub fn discover(configured: Option<&Path>, search_path: Option<&OsStr>) -> Result<Self> {
        if let Some(path) = configured {
            log::debug!("using configured compose binary {}", path.display());
            return Ok(Self::from_path(path));
        }

        let path_var = search_path.map(OsStr::to_os_string).or_else(|| env::var_os("PATH"));
        let Some(path_var) = path_var else {
            return Err(Error::ComposeNotFound);
        };

        if let Some(found) = find_executable(STANDALONE, &path_var) {
            log::debug!("using standalone docker compose at {}", found.display());
            return Ok(Self::new(found, false));
        }
        if let Some(found) = find_executable(DOCKER, &path_var) {
            log::debug!("using docker compose plugin at {}", found.display());
            return Ok(Self::new(found, true));
        }
        Err(Error::ComposeNotFound)
    }

    /// Path to the executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Whether arguments are prefixed with `compose`.
    #[must_use]
    pub const fn is_plugin(&self) -> bool {
        self.plugin
    }

    /// Builds the invocation for compose arguments `args`.
    #[must_use]
    pub fn invocation(&self, args: Vec<String>, working_dir: &Path) -> Invocation {
        let args = if self.plugin {
            std::iter::once("compose".to_string()).chain(args).collect()
        } else {
            args
        };
        Invocation {
            program: self.executable.clone(),
            args,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Verifies the binary answers a version query and returns its reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ComposeNotFound`] if the process cannot start and
    /// [`Error::CommandFailed`] if it exits unsuccessfully.
    pub fn check(&self, runner: &dyn CommandRunner, working_dir: &Path) -> Result<String> {
        let args = if self.plugin {
            vec!["version".to_string()]
        } else {
            vec!["--version".to_string()]
        };
        let invocation = self.invocation(args, working_dir);
        let out = runner.run(&invocation).map_err(|e| {
            log::debug!("failed to start {}: {e}", invocation.program.display());
            Error::ComposeNotFound
        })?;
        if !out.success() {
            return Err(Error::CommandFailed {
                command: "version".to_string(),
                exit_code: out.exit_code,
                output: out.output,
            });
        }
        let version = out.output.trim().to_string();
        log::debug!("docker compose version: {version}");
        Ok(version)
    }
}

fn find_executable(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
