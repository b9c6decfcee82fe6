//! Compose verbs understood by the executor.

use std::fmt;
use std::str::FromStr;

/// A docker compose subcommand.
///
/// # Examples
///
/// ```
/// use qec::executor::ComposeCommand;
///
/// let cmd: ComposeCommand = "up".parse().unwrap();
/// assert_eq!(cmd, ComposeCommand::Up);
/// assert_eq!(cmd.leading_args(), ["--remove-orphans"]);
///
/// let cmd: ComposeCommand = "pull".parse().unwrap();
/// assert_eq!(cmd.name(), "pull");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComposeCommand {
    /// `up`
    Up,
    /// `down`
    Down,
    /// `config`
    Config,
    /// `ps`
    Ps,
    /// `logs`
    Logs,
    /// Any other verb, passed through as is.
    Generic(String),
}

impl ComposeCommand {
    /// The verb as given to docker compose.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Config => "config",
            Self::Ps => "ps",
            Self::Logs => "logs",
            Self::Generic(name) => name,
        }
    }

    /// Whether the command's output is meant for the user.
    #[must_use]
    pub const fn produces_displayable_output(&self) -> bool {
        matches!(self, Self::Config | Self::Ps | Self::Logs)
    }

    /// Arguments always placed right after the verb.
    #[must_use]
    pub fn leading_args(&self) -> &'static [&'static str] {
        match self {
            Self::Up | Self::Down => &["--remove-orphans"],
            _ => &[],
        }
    }
}

impl fmt::Display for ComposeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComposeCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let verb = s.trim();
        if verb.is_empty() {
            return Err("compose command cannot be empty".to_string());
        }
        if verb.starts_with('-') {
            return Err(format!("'{verb}' is an option, not a compose command"));
        }
        Ok(match verb {
            "up" => Self::Up,
            "down" => Self::Down,
            "config" => Self::Config,
            "ps" => Self::Ps,
            "logs" => Self::Logs,
            other => Self::Generic(other.to_string()),
        })
    }
}
