//! `QEC_*` environment overrides.

use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::settings::schema::Settings;

/// Port offset override.
pub const PORT_OFFSET_VAR: &str = "QEC_PORT_OFFSET";
/// Merged file name override.
pub const MERGED_FILE_VAR: &str = "QEC_MERGED_FILE";
/// Compose executable override.
pub const COMPOSE_BINARY_VAR: &str = "QEC_COMPOSE_BINARY";
/// Collision policy override.
pub const NAMESPACE_COLLISION_VAR: &str = "QEC_NAMESPACE_COLLISION";
/// `.env` loading override.
pub const LOAD_DOTENV_VAR: &str = "QEC_LOAD_DOTENV";

/// Applies environment variable overrides to settings.
///
/// # Examples
///
/// ```no_run
/// use qec::settings::{EnvironmentSettings, Settings};
///
/// let mut settings = Settings::default();
/// EnvironmentSettings::apply_overrides(&mut settings).unwrap();
/// ```
pub struct EnvironmentSettings;

impl EnvironmentSettings {
    /// Reads every `QEC_*` variable that maps to a setting.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong shape.
    pub fn apply_overrides(settings: &mut Settings) -> Result<()> {
        if let Ok(offset) = env::var(PORT_OFFSET_VAR) {
            settings.port_offset = Some(offset.trim().parse().map_err(|_| Error::Validation {
                field: PORT_OFFSET_VAR.into(),
                message: format!("Invalid port offset: '{offset}'"),
            })?);
        }

        if let Ok(name) = env::var(MERGED_FILE_VAR) {
            settings.merged_file_name = Some(name);
        }

        if let Some(binary) = env::var_os(COMPOSE_BINARY_VAR) {
            settings.compose_binary = Some(PathBuf::from(binary));
        }

        if let Ok(policy) = env::var(NAMESPACE_COLLISION_VAR) {
            settings.namespace_collision =
                Some(policy.parse().map_err(|message| Error::Validation {
                    field: NAMESPACE_COLLISION_VAR.into(),
                    message,
                })?);
        }

        if let Ok(val) = env::var(LOAD_DOTENV_VAR) {
            settings.load_dotenv = Some(Self::parse_bool(LOAD_DOTENV_VAR, &val)?);
        }

        Ok(())
    }

    /// Parse a boolean value from a string.
    ///
    /// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
    fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!(
                    "Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }
}
