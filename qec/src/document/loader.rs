//! Reading compose files into [`Document`]s.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::document::environment::{Environment, DOTENV_FILE};
use crate::document::schema::ComposeFile;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::path::normalize::normalize;

/// Loads compose files, interpolating variables along the way.
///
/// Interpolation sees the process environment (or the one supplied with
/// [`with_environment`](Self::with_environment)) layered over the `.env`
/// file next to each document. Variables from the environment win.
///
/// # Examples
///
/// ```no_run
/// use qec::document::DocumentLoader;
/// use std::path::Path;
///
/// let doc = DocumentLoader::new().load(Path::new("web/docker-compose.yml")).unwrap();
/// println!("{} services", doc.resources().services.len());
/// ```
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    environment: Option<Environment>,
    load_dotenv: bool,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader {
    /// A loader using the process environment and `.env` files.
    #[must_use]
    pub fn new() -> Self {
        Self {
            environment: None,
            load_dotenv: true,
        }
    }

    /// Uses `environment` instead of the process environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Enables or disables reading `.env` next to each document.
    #[must_use]
    pub fn with_dotenv(mut self, enabled: bool) -> Self {
        self.load_dotenv = enabled;
        self
    }

    /// Loads the compose file at `path`.
    ///
    /// Relative paths are taken against the current directory.
    ///
    /// # Errors
    ///
    /// - [`Error::PathResolution`] if the path cannot be made absolute.
    /// - [`Error::DocumentLoad`] if the file cannot be read or decoded.
    /// - [`Error::Interpolation`] if a variable reference is malformed or a
    ///   required variable is missing.
    pub fn load(&self, path: &Path) -> Result<Document> {
        let source_path = normalize(path)?;
        log::debug!("loading compose file {}", source_path.display());

        let contents = fs::read_to_string(&source_path).map_err(|e| Error::DocumentLoad {
            path: source_path.clone(),
            reason: e.to_string(),
        })?;
        self.load_str(&source_path, &contents)
    }

    /// Decodes `contents` as though read from the absolute `source_path`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the read.
    pub fn load_str(&self, source_path: &Path, contents: &str) -> Result<Document> {
        let load_error = |reason: String| Error::DocumentLoad {
            path: source_path.to_path_buf(),
            reason,
        };

        let mut value: Value =
            serde_yaml::from_str(contents).map_err(|e| load_error(format!("invalid YAML: {e}")))?;
        if value.is_null() {
            value = Value::Mapping(Mapping::new());
        }
        value
            .apply_merge()
            .map_err(|e| load_error(format!("invalid merge key: {e}")))?;

        let base_directory = source_path.parent().unwrap_or(source_path);
        let environment = self.environment_for(base_directory)?;

        let mut unset = Vec::new();
        interpolate_value(&mut value, &environment, source_path, &mut unset)?;
        let mut seen = std::collections::HashSet::new();
        unset.retain(|name| seen.insert(name.clone()));

        let file: ComposeFile = serde_yaml::from_value(value).map_err(|e| load_error(e.to_string()))?;
        log::debug!(
            "loaded {} service(s) from {}",
            file.resources.services.len(),
            source_path.display()
        );

        Ok(Document::new(source_path, file.resources)?
            .with_project_name(file.name)
            .with_unset_variables(unset))
    }

    fn environment_for(&self, dir: &Path) -> Result<Environment> {
        let environment = self
            .environment
            .clone()
            .unwrap_or_else(Environment::from_os);
        if !self.load_dotenv {
            return Ok(environment);
        }

        let dotenv = Environment::read_dotenv(dir).map_err(|e| Error::DocumentLoad {
            path: dir.join(DOTENV_FILE),
            reason: e.to_string(),
        })?;
        Ok(match dotenv {
            Some(vars) => {
                log::debug!("read {} variable(s) from {}", vars.len(), dir.join(DOTENV_FILE).display());
                environment.with_fallback(vars)
            }
            None => environment,
        })
    }
}

fn interpolate_value(
    value: &mut Value,
    environment: &Environment,
    path: &Path,
    unset: &mut Vec<String>,
) -> Result<()> {
    match value {
        Value::String(s) => {
            let out = environment
                .interpolate(s)
                .map_err(|e| Error::Interpolation {
                    path: path.to_path_buf(),
                    variable: e.variable,
                    message: e.message,
                })?;
            unset.extend(out.unset);
            *s = out.value;
        }
        Value::Sequence(items) => {
            for item in items {
                interpolate_value(item, environment, path, unset)?;
            }
        }
        Value::Mapping(map) => {
            for item in map.values_mut() {
                interpolate_value(item, environment, path, unset)?;
            }
        }
        Value::Tagged(tagged) => interpolate_value(&mut tagged.value, environment, path, unset)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}
