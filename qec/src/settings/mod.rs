//! Settings for the qec tool itself.
//!
//! These control how compose files are merged and run; they are separate
//! from the compose files being merged.
//!
//! # Precedence
//!
//! Highest to lowest:
//!
//! 1. Programmatic overrides (via `SettingsBuilder::with_settings`)
//! 2. Environment variables (`QEC_*`)
//! 3. Private project settings (`qec.local.yaml`)
//! 4. Project settings (`qec.yaml`)
//! 5. User settings (`~/.qec/config.yaml`)
//! 6. Built-in defaults
//!
//! # Examples
//!
//! ```no_run
//! use qec::settings::SettingsBuilder;
//! use std::path::Path;
//!
//! let settings = SettingsBuilder::new()
//!     .with_working_dir(Path::new("/path/to/stack"))
//!     .build()
//!     .unwrap();
//! println!("offset: {}", settings.port_offset());
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use builder::SettingsBuilder;
pub use environment::EnvironmentSettings;
pub use loader::{default_data_dir, SettingsLoader, SettingsSource};
pub use merger::SettingsMerger;
pub use schema::{Settings, DEFAULT_MERGED_FILE, MERGED_FILE_SUFFIX};
pub use validator::SettingsValidator;
