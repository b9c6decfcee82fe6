#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # qec
//!
//! A library for running several independent Docker Compose projects as one.
//!
//! Each compose file keeps working from its own directory: relative paths are
//! made absolute, services and named resources are prefixed with the
//! directory's name, and host ports that collide across projects are moved
//! by a fixed offset. The result is a single compose project that can be
//! written out and handed to docker compose.
//!
//! ## Core Types
//!
//! - [`DocumentLoader`] and [`Document`]: Reading and interpolating compose files
//! - [`PathResolver`]: Rooting relative paths at each file's directory
//! - [`ResourceNamespacer`]: Prefixing names and rewriting references
//! - [`PortConflictResolver`]: Moving colliding host ports
//! - [`ConfigMerger`] and [`MergeReport`]: The merge pipeline and its events
//! - [`Executor`]: Writing the merged file and running docker compose
//! - [`Settings`]: Layered tool configuration
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use qec::{ConfigMerger, DocumentLoader};
//! use std::path::Path;
//!
//! let loader = DocumentLoader::new().with_dotenv(false);
//! let docs = vec![
//!     loader.load_str(
//!         Path::new("/stack/web/docker-compose.yml"),
//!         "services:\n  app:\n    image: nginx\n    ports: ['80:80']\n    depends_on: [db]\n  db:\n    image: postgres\n",
//!     ).unwrap(),
//!     loader.load_str(
//!         Path::new("/stack/api/docker-compose.yml"),
//!         "services:\n  app:\n    image: api\n    ports: ['80:8080']\n",
//!     ).unwrap(),
//! ];
//!
//! let outcome = ConfigMerger::default().merge(docs).unwrap();
//! let services = outcome.project.services();
//! assert!(services["web_app"].depends_on.contains_key("web_db"));
//! // Within a conflict the alphabetically first service keeps its port.
//! assert_eq!(services["api_app"].ports[0].published.as_deref(), Some("80"));
//! assert_eq!(services["web_app"].ports[0].published.as_deref(), Some("180"));
//! ```

pub mod document;
pub mod error;
pub mod executor;
pub mod logging;
pub mod merge;
pub mod path;
pub mod port;
pub mod settings;

// Re-export key types at crate root for convenience
pub use document::{Document, DocumentLoader, Environment, ProjectResources, ServiceSpec};
pub use error::{Error, Result};
pub use executor::{ComposeBinary, ComposeCommand, ExecutionResult, Executor};
pub use logging::{init_logger, LogLevel, Logger};
pub use merge::{
    CollisionPolicy, ConfigMerger, MergeEvent, MergeOptions, MergeOutcome, MergeReport,
    MergedProject, ResourceNamespacer,
};
pub use path::PathResolver;
pub use port::{Port, PortConflictResolver};
pub use settings::{Settings, SettingsBuilder};
