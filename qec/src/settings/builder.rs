//! Assembling settings from every layer.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::settings::environment::EnvironmentSettings;
use crate::settings::loader::SettingsLoader;
use crate::settings::merger::SettingsMerger;
use crate::settings::schema::Settings;
use crate::settings::validator::SettingsValidator;

/// Builds the effective settings.
///
/// Layers, lowest precedence first: built-in defaults, user file, project
/// files, `QEC_*` environment variables, programmatic overrides.
///
/// # Examples
///
/// ```
/// use qec::settings::{Settings, SettingsBuilder};
///
/// let settings = SettingsBuilder::new()
///     .skip_files()
///     .skip_env()
///     .with_settings(Settings { port_offset: Some(500), ..Default::default() })
///     .build()
///     .unwrap();
/// assert_eq!(settings.port_offset(), 500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    working_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    skip_files: bool,
    skip_env: bool,
    overrides: Option<Settings>,
}

impl SettingsBuilder {
    /// A builder using every layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory to start project file discovery from (default: current dir).
    #[must_use]
    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Directory holding the user `config.yaml` (default: `~/.qec`).
    #[must_use]
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.data_dir = Some(dir.to_path_buf());
        self
    }

    /// Ignore settings files.
    #[must_use]
    pub fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Ignore `QEC_*` environment variables.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Highest-precedence overrides, usually from CLI flags.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.overrides = Some(settings);
        self
    }

    /// Builds and validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed, an
    /// environment variable is malformed, or the result fails validation.
    pub fn build(self) -> Result<Settings> {
        let mut settings = Settings::defaults();

        if !self.skip_files {
            let working_dir = match self.working_dir {
                Some(dir) => dir,
                None => env::current_dir()?,
            };
            let sources = SettingsLoader::load_all(&working_dir, self.data_dir.as_deref())?;
            for source in &sources {
                log::debug!("applying settings from {}", source.path.display());
            }
            SettingsMerger::merge_into(&mut settings, &SettingsMerger::merge(sources));
        }

        if !self.skip_env {
            EnvironmentSettings::apply_overrides(&mut settings)?;
        }

        if let Some(overrides) = &self.overrides {
            SettingsMerger::merge_into(&mut settings, overrides);
        }

        SettingsValidator::validate(&settings)?;
        Ok(settings)
    }
}
