//! Settings file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::settings::schema::Settings;

/// Project settings file name.
pub const PROJECT_FILE: &str = "qec.yaml";

/// Private (uncommitted) project settings file name.
pub const LOCAL_FILE: &str = "qec.local.yaml";

/// A settings file and its precedence.
///
/// Lower precedence values are overridden by higher ones.
#[derive(Debug, Clone)]
pub struct SettingsSource {
    /// Path to the settings file.
    pub path: PathBuf,
    /// Precedence level (higher values take priority).
    pub precedence: u8,
    /// Parsed settings.
    pub settings: Settings,
}

/// Finds and reads settings files.
///
/// # Examples
///
/// ```no_run
/// use qec::settings::SettingsLoader;
/// use std::path::Path;
///
/// let sources = SettingsLoader::load_all(Path::new("."), None).unwrap();
/// println!("Found {} settings files", sources.len());
/// ```
pub struct SettingsLoader;

impl SettingsLoader {
    /// Discover and load all settings files.
    ///
    /// Searches for:
    /// 1. User settings at `~/.qec/config.yaml`, or `{data_dir}/config.yaml` (precedence 1)
    /// 2. `qec.yaml` walking up from `working_dir` (precedence 2)
    /// 3. `qec.local.yaml` in the same directory (precedence 3)
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or
    /// parsed.
    pub fn load_all(working_dir: &Path, data_dir: Option<&Path>) -> Result<Vec<SettingsSource>> {
        let mut sources = Vec::new();

        if let Some(user) = Self::load_user_settings(data_dir)? {
            sources.push(user);
        }
        sources.extend(Self::discover_project_settings(working_dir)?);
        sources.sort_by_key(|s| s.precedence);

        Ok(sources)
    }

    fn load_user_settings(data_dir: Option<&Path>) -> Result<Option<SettingsSource>> {
        let path = match data_dir {
            Some(dir) => dir.join("config.yaml"),
            None => match default_data_dir() {
                Some(dir) => dir.join("config.yaml"),
                None => return Ok(None),
            },
        };

        if !path.exists() {
            return Ok(None);
        }

        let settings = Self::load_file(&path)?;
        Ok(Some(SettingsSource {
            path,
            precedence: 1,
            settings,
        }))
    }

    /// Walks up from `start_dir`, stopping at the first directory holding
    /// `qec.yaml` or `qec.local.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if a discovered file cannot be read or parsed.
    pub fn discover_project_settings(start_dir: &Path) -> Result<Vec<SettingsSource>> {
        let mut found = Vec::new();
        let mut current = start_dir.to_path_buf();

        loop {
            for (name, precedence) in [(PROJECT_FILE, 2), (LOCAL_FILE, 3)] {
                let path = current.join(name);
                if path.exists() {
                    let settings = Self::load_file(&path)?;
                    found.push(SettingsSource {
                        path,
                        precedence,
                        settings,
                    });
                }
            }

            if !found.is_empty() || !current.pop() {
                break;
            }
        }

        Ok(found)
    }

    /// Load and parse one settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings
    /// YAML.
    pub fn load_file(path: &Path) -> Result<Settings> {
        let contents = fs::read_to_string(path).map_err(|e| Error::PathResolution {
            path: path.to_path_buf(),
            reason: format!("Failed to read settings file: {e}"),
        })?;

        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| Error::Validation {
            field: format!("{}", path.display()),
            message: format!("Invalid YAML: {e}"),
        })
    }
}

/// The per-user data directory, `~/.qec`.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".qec"))
}
