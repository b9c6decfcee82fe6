//! Layering settings sources.

use crate::settings::loader::SettingsSource;
use crate::settings::schema::Settings;

/// Merges settings layers by precedence.
///
/// # Examples
///
/// ```
/// use qec::settings::{Settings, SettingsMerger};
///
/// let low = Settings { port_offset: Some(10), ..Default::default() };
/// let high = Settings { port_offset: Some(20), ..Default::default() };
///
/// let mut result = low;
/// SettingsMerger::merge_into(&mut result, &high);
/// assert_eq!(result.port_offset, Some(20));
/// ```
pub struct SettingsMerger;

impl SettingsMerger {
    /// Merges sources given from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<SettingsSource>) -> Settings {
        let mut result = Settings::default();
        for source in sources {
            Self::merge_into(&mut result, &source.settings);
        }
        result
    }

    /// Copies every field `source` sets onto `target`.
    pub fn merge_into(target: &mut Settings, source: &Settings) {
        if source.port_offset.is_some() {
            target.port_offset = source.port_offset;
        }
        if source.merged_file_name.is_some() {
            target.merged_file_name.clone_from(&source.merged_file_name);
        }
        if source.compose_binary.is_some() {
            target.compose_binary.clone_from(&source.compose_binary);
        }
        if source.namespace_collision.is_some() {
            target.namespace_collision = source.namespace_collision;
        }
        if source.load_dotenv.is_some() {
            target.load_dotenv = source.load_dotenv;
        }
    }
}
