//! Compose documents: the typed model, the loader and interpolation.
//!
//! A [`Document`] is one compose file anchored to the directory it lives in.
//! Documents are created by [`DocumentLoader`] (or directly with
//! [`Document::new`] for in-memory input) and then flow by value through the
//! merge pipeline.

pub mod environment;
pub mod loader;
pub mod schema;

use std::path::{Path, PathBuf};

pub use environment::{parse_dotenv, Environment, Interpolated, InterpolationError};
pub use loader::DocumentLoader;
pub use schema::{
    BuildSpec, ComposeFile, ConfigSpec, ContainerPort, Dependency, FileResourceSpec, LongMount,
    MountSource, NetworkSpec, PortBinding, ProjectResources, Protocol, ResourceRef, SecretSpec,
    ServiceSpec, Services, VolumeMount, VolumeSpec,
};

use crate::error::{Error, Result};

/// One compose file and the directory its relative paths are rooted at.
///
/// # Examples
///
/// ```
/// use qec::document::{Document, ProjectResources};
///
/// let doc = Document::new("/srv/web/docker-compose.yml", ProjectResources::default()).unwrap();
/// assert_eq!(doc.base_directory().to_str(), Some("/srv/web"));
/// assert_eq!(doc.namespace_token().unwrap(), "web");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) source_path: PathBuf,
    pub(crate) base_directory: PathBuf,
    pub(crate) project_name: Option<String>,
    pub(crate) resources: ProjectResources,
    pub(crate) unset_variables: Vec<String>,
}

impl Document {
    /// Creates a document for an absolute source path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] if `source_path` is relative or has
    /// no parent directory.
    pub fn new(source_path: impl Into<PathBuf>, resources: ProjectResources) -> Result<Self> {
        let source_path = source_path.into();
        if !source_path.is_absolute() {
            return Err(Error::PathResolution {
                path: source_path,
                reason: "document path must be absolute".to_string(),
            });
        }
        let base_directory = source_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::PathResolution {
                path: source_path.clone(),
                reason: "document path has no parent directory".to_string(),
            })?;

        Ok(Self {
            source_path,
            base_directory,
            project_name: None,
            resources,
            unset_variables: Vec::new(),
        })
    }

    /// Sets the declared project name.
    #[must_use]
    pub fn with_project_name(mut self, name: Option<String>) -> Self {
        self.project_name = name;
        self
    }

    pub(crate) fn with_unset_variables(mut self, variables: Vec<String>) -> Self {
        self.unset_variables = variables;
        self
    }

    /// The absolute path the document was read from.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The directory containing the document.
    #[must_use]
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// The project name declared in the file, if any.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// The document's resources.
    #[must_use]
    pub fn resources(&self) -> &ProjectResources {
        &self.resources
    }

    /// Variables referenced during interpolation that had no value.
    #[must_use]
    pub fn unset_variables(&self) -> &[String] {
        &self.unset_variables
    }

    /// The prefix applied to this document's resources: the final segment
    /// of its base directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] if the base directory has no final
    /// segment (the filesystem root) or it is not valid UTF-8.
    pub fn namespace_token(&self) -> Result<String> {
        let segment = self
            .base_directory
            .file_name()
            .ok_or_else(|| Error::PathResolution {
                path: self.base_directory.clone(),
                reason: "base directory has no final segment to namespace with".to_string(),
            })?;
        segment
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| Error::PathResolution {
                path: self.base_directory.clone(),
                reason: "base directory name is not valid UTF-8".to_string(),
            })
    }
}
