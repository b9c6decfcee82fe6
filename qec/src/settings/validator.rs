//! Settings validation.

use crate::error::{Error, Result};
use crate::settings::schema::Settings;

/// Validates settings after all layers are merged.
///
/// # Examples
///
/// ```
/// use qec::settings::{Settings, SettingsValidator};
///
/// SettingsValidator::validate(&Settings::defaults()).unwrap();
///
/// let zero = Settings { port_offset: Some(0), ..Default::default() };
/// assert!(SettingsValidator::validate(&zero).is_err());
/// ```
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate a complete settings value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first invalid field.
    pub fn validate(settings: &Settings) -> Result<()> {
        if settings.port_offset == Some(0) {
            return Err(Error::Validation {
                field: "port_offset".into(),
                message: "Port offset must be greater than 0".into(),
            });
        }

        if let Some(ref name) = settings.merged_file_name {
            Self::validate_file_name(name)?;
        }

        if let Some(ref binary) = settings.compose_binary {
            if binary.as_os_str().is_empty() {
                return Err(Error::Validation {
                    field: "compose_binary".into(),
                    message: "Compose binary path cannot be empty".into(),
                });
            }
        }

        Ok(())
    }

    fn validate_file_name(name: &str) -> Result<()> {
        let invalid = |message: &str| Error::Validation {
            field: "merged_file_name".into(),
            message: message.into(),
        };

        if name.trim().is_empty() {
            return Err(invalid("Merged file name cannot be empty"));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(invalid("Merged file name must be a plain file name"));
        }
        if !(name.ends_with(".yml") || name.ends_with(".yaml")) {
            return Err(invalid("Merged file name must end in .yml or .yaml"));
        }
        Ok(())
    }
}
