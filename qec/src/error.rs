//! Error types for the qec library.
//!
//! This module provides the error hierarchy for loading, resolving, merging
//! and executing compose projects, using `thiserror` for ergonomic error
//! handling.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a qec error.
///
/// # Examples
///
/// ```
/// use qec::{Error, Result};
///
/// fn example_operation() -> Result<u16> {
///     Ok(8080)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the qec library.
#[derive(Debug, Error)]
pub enum Error {
    /// The merger was given no documents.
    #[error("no compose files provided")]
    EmptyInput,

    /// A path could not be made absolute.
    #[error("cannot resolve path {}: {reason}", path.display())]
    PathResolution {
        /// The offending path.
        path: PathBuf,
        /// Why resolution failed.
        reason: String,
    },

    /// The fixed-offset strategy could not place a binding.
    #[error("unable to resolve port conflict on port {port}: {details}")]
    UnresolvableConflict {
        /// The host port that could not be placed.
        port: u16,
        /// Details about the conflict.
        details: String,
    },

    /// Applying the offset pushed a host port past 65535.
    #[error(
        "port {port} of service '{service}' cannot be shifted by {offset} x {index}: exceeds 65535"
    )]
    PortOutOfRange {
        /// The service whose binding overflowed.
        service: String,
        /// The original host port.
        port: u16,
        /// The configured offset.
        offset: u16,
        /// The service's position within the conflict.
        index: usize,
    },

    /// Two documents produced the same namespace token.
    #[error(
        "namespace '{token}' is used by both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateNamespace {
        /// The colliding token.
        token: String,
        /// The earlier document.
        first: PathBuf,
        /// The later document.
        second: PathBuf,
    },

    /// A compose document could not be loaded.
    #[error("failed to load compose file {}: {reason}", path.display())]
    DocumentLoad {
        /// The document path.
        path: PathBuf,
        /// The reason loading failed.
        reason: String,
    },

    /// Variable interpolation failed.
    #[error("interpolation failed in {} for '{variable}': {message}", path.display())]
    Interpolation {
        /// The document being interpolated.
        path: PathBuf,
        /// The variable that failed.
        variable: String,
        /// The message supplied by the document or the parser.
        message: String,
    },

    /// YAML could not be parsed or produced.
    #[error("YAML error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// An invalid port number was provided.
    #[error("invalid port {value}: {reason}")]
    InvalidPort {
        /// The invalid port value.
        value: u16,
        /// The reason the port is invalid.
        reason: String,
    },

    /// Neither `docker-compose` nor `docker` was found.
    #[error("neither docker-compose nor docker executable found in PATH")]
    ComposeNotFound,

    /// The compose subprocess exited unsuccessfully.
    #[error("docker compose {command} failed with exit code {}\nOutput: {output}",
        exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    CommandFailed {
        /// The compose verb that failed.
        command: String,
        /// The exit code, if the process exited normally.
        exit_code: Option<i32>,
        /// Combined stdout and stderr.
        output: String,
    },
}

impl From<crate::port::InvalidPortError> for Error {
    fn from(err: crate::port::InvalidPortError) -> Self {
        Self::InvalidPort {
            value: err.value,
            reason: err.reason,
        }
    }
}

impl Error {
    /// Check if the error came from port conflict resolution.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::Error;
    ///
    /// let err = Error::UnresolvableConflict { port: 180, details: "taken".into() };
    /// assert!(err.is_port_conflict());
    /// assert!(!Error::EmptyInput.is_port_conflict());
    /// ```
    #[must_use]
    pub fn is_port_conflict(&self) -> bool {
        matches!(
            self,
            Self::UnresolvableConflict { .. } | Self::PortOutOfRange { .. }
        )
    }
}
