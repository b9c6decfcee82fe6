//! Settings schema.
//!
//! Every field is optional so that layers can be merged; use the accessor
//! methods to read a value with its built-in default applied.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::merge::{CollisionPolicy, MergeOptions};
use crate::port::DEFAULT_PORT_OFFSET;

/// Suffix of the merged file written next to the first compose file.
pub const MERGED_FILE_SUFFIX: &str = ".merged.yml";

/// Merged file name used when there is no first file to derive one from.
pub const DEFAULT_MERGED_FILE: &str = "docker-compose.merged.yml";

/// Tool settings, as read from `qec.yaml` and friends.
///
/// # Examples
///
/// ```
/// use qec::settings::Settings;
///
/// let settings: Settings = serde_yaml::from_str("port_offset: 1000\n").unwrap();
/// assert_eq!(settings.port_offset(), 1000);
/// assert!(settings.load_dotenv());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Distance between reassigned host ports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_offset: Option<u16>,

    /// Name of the merged file. Defaults to `<first file stem>.merged.yml`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_file_name: Option<String>,

    /// Compose executable to use instead of searching `PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose_binary: Option<PathBuf>,

    /// Handling of documents that share a directory name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_collision: Option<CollisionPolicy>,

    /// Whether `.env` files next to compose files are read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_dotenv: Option<bool>,
}

impl Settings {
    /// Built-in defaults for every field that has one.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            port_offset: Some(DEFAULT_PORT_OFFSET),
            merged_file_name: None,
            compose_binary: None,
            namespace_collision: Some(CollisionPolicy::Fail),
            load_dotenv: Some(true),
        }
    }

    /// Effective port offset.
    #[must_use]
    pub fn port_offset(&self) -> u16 {
        self.port_offset.unwrap_or(DEFAULT_PORT_OFFSET)
    }

    /// Effective collision policy.
    #[must_use]
    pub fn namespace_collision(&self) -> CollisionPolicy {
        self.namespace_collision.unwrap_or_default()
    }

    /// Effective `.env` setting.
    #[must_use]
    pub fn load_dotenv(&self) -> bool {
        self.load_dotenv.unwrap_or(true)
    }

    /// Options for the merge engine.
    #[must_use]
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            port_offset: self.port_offset(),
            collision_policy: self.namespace_collision(),
        }
    }

    /// Name of the merged file for a run whose first compose file is
    /// `first_file`.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::settings::Settings;
    /// use std::path::Path;
    ///
    /// let settings = Settings::default();
    /// assert_eq!(
    ///     settings.merged_file_name_for(Path::new("/srv/web/docker-compose.yml")),
    ///     "docker-compose.merged.yml"
    /// );
    /// ```
    #[must_use]
    pub fn merged_file_name_for(&self, first_file: &Path) -> String {
        if let Some(name) = &self.merged_file_name {
            return name.clone();
        }
        let stem = first_file
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty());
        stem.map_or_else(
            || DEFAULT_MERGED_FILE.to_string(),
            |stem| format!("{stem}{MERGED_FILE_SUFFIX}"),
        )
    }
}
