//! Rooting a document's relative paths at its base directory.

use std::path::Path;

use crate::document::{Document, MountSource};
use crate::error::{Error, Result};
use crate::merge::{MergeEvent, MergeReport};
use crate::path::normalize::absolutize;

/// Makes a document's relative paths absolute.
///
/// Build contexts are always resolved. Relative bind-mount sources and the
/// `file` of top-level configs and secrets are resolved too unless turned
/// off. Absolute paths are returned unchanged, so resolving twice is a no-op.
///
/// # Examples
///
/// ```
/// use qec::document::{BuildSpec, Document, ProjectResources, ServiceSpec};
/// use qec::merge::MergeReport;
/// use qec::path::PathResolver;
///
/// let mut resources = ProjectResources::default();
/// resources.services.insert(
///     "api".into(),
///     ServiceSpec { build: Some(BuildSpec::with_context("./api")), ..Default::default() },
/// );
/// let doc = Document::new("/srv/web/docker-compose.yml", resources).unwrap();
///
/// let mut report = MergeReport::default();
/// let doc = PathResolver::new().resolve(doc, &mut report).unwrap();
/// let build = doc.resources().services["api"].build.as_ref().unwrap();
/// assert_eq!(build.context, "/srv/web/api");
/// ```
#[derive(Debug, Clone)]
pub struct PathResolver {
    bind_mounts: bool,
    resource_files: bool,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self {
            bind_mounts: true,
            resource_files: true,
        }
    }
}

impl PathResolver {
    /// A resolver that rewrites every supported path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure whether relative bind-mount sources are rewritten.
    #[must_use]
    pub const fn with_bind_mounts(mut self, enabled: bool) -> Self {
        self.bind_mounts = enabled;
        self
    }

    /// Configure whether config and secret `file` paths are rewritten.
    #[must_use]
    pub const fn with_resource_files(mut self, enabled: bool) -> Self {
        self.resource_files = enabled;
        self
    }

    /// Resolves the document's paths against its base directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] if a path uses `~user` or cannot be
    /// represented as UTF-8. `..` past the filesystem root stays at the root.
    pub fn resolve(&self, mut document: Document, report: &mut MergeReport) -> Result<Document> {
        let base = document.base_directory.clone();
        let source = document.source_path.clone();
        let resources = &mut document.resources;

        for (name, service) in &mut resources.services {
            if let Some(build) = service.build.as_mut() {
                if !is_remote_context(&build.context) {
                    let resolved = resolve_path(&base, &build.context, &source)?;
                    if resolved != build.context {
                        report.push(MergeEvent::BuildContextResolved {
                            service: name.clone(),
                            from: std::mem::replace(&mut build.context, resolved.clone()),
                            to: resolved,
                        });
                    }
                }
            }

            if self.bind_mounts {
                for mount in &mut service.volume_mounts {
                    let MountSource::Bind(host) = mount.source() else {
                        continue;
                    };
                    let resolved = resolve_path(&base, host, &source)?;
                    if resolved != host {
                        let from = host.to_string();
                        mount.set_source(&resolved);
                        report.push(MergeEvent::PathResolved {
                            owner: name.clone(),
                            from,
                            to: resolved,
                        });
                    }
                }
            }
        }

        if self.resource_files {
            let files = resources
                .configs
                .iter_mut()
                .chain(resources.secrets.iter_mut());
            for (name, spec) in files {
                let Some(file) = spec.file.as_mut() else {
                    continue;
                };
                let resolved = resolve_path(&base, file, &source)?;
                if resolved != *file {
                    report.push(MergeEvent::PathResolved {
                        owner: name.clone(),
                        from: std::mem::replace(file, resolved.clone()),
                        to: resolved,
                    });
                }
            }
        }

        Ok(document)
    }

    /// Resolves a single build context against `base`.
    ///
    /// Absolute and remote contexts are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] as for [`resolve`](Self::resolve).
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::path::PathResolver;
    /// use std::path::Path;
    ///
    /// let base = Path::new("/srv/web");
    /// assert_eq!(PathResolver::resolve_build_context(base, "../shared").unwrap(), "/srv/shared");
    /// assert_eq!(PathResolver::resolve_build_context(base, "/opt/app").unwrap(), "/opt/app");
    /// ```
    pub fn resolve_build_context(base: &Path, context: &str) -> Result<String> {
        if is_remote_context(context) || Path::new(context).is_absolute() {
            return Ok(context.to_string());
        }
        resolve_path(base, context, base)
    }
}

fn resolve_path(base: &Path, raw: &str, document: &Path) -> Result<String> {
    let path = Path::new(raw);
    if path.is_absolute() {
        return Ok(raw.to_string());
    }

    let resolved = absolutize(base, path).map_err(|e| match e {
        Error::PathResolution { path, reason } => Error::PathResolution {
            path,
            reason: format!("{reason} (in {})", document.display()),
        },
        other => other,
    })?;

    resolved
        .into_os_string()
        .into_string()
        .map_err(|os| Error::PathResolution {
            path: os.into(),
            reason: format!("path is not valid UTF-8 (in {})", document.display()),
        })
}

fn is_remote_context(context: &str) -> bool {
    context.contains("://") || context.starts_with("git@") || context.starts_with("github.com/")
}
