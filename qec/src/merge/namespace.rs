//! Prefixing a document's resources with its namespace token.
//!
//! Services, volumes, configs and secrets are renamed to `token_name`.
//! Networks keep their names so that documents can share them. References
//! inside services (`depends_on`, `links`, named-volume mounts, `configs`,
//! `secrets`) are rewritten through one translation table per category;
//! names not defined in the document are left alone. An external volume,
//! config or secret without an explicit `name` gets its original key as
//! `name`, so compose still finds the existing object.

use std::collections::BTreeMap;
use std::mem;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::document::{
    Document, FileResourceSpec, MountSource, ProjectResources, ServiceSpec, Services, VolumeSpec,
};
use crate::error::Result;
use crate::merge::report::{MergeEvent, MergeReport, ReferenceKind, ResourceKind};

/// Maps document-local names of one category to namespaced names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    names: BTreeMap<String, String>,
}

impl TranslationTable {
    /// The namespaced form of `name`, if `name` is defined in the document.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A document whose resources carry its namespace token.
///
/// Only [`ResourceNamespacer::apply`] produces one, and it consumes the
/// [`Document`], so a document can never be namespaced twice.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespacedDocument {
    pub(crate) source_path: PathBuf,
    pub(crate) token: String,
    pub(crate) project_name: Option<String>,
    pub(crate) resources: ProjectResources,
    pub(crate) unset_variables: Vec<String>,
}

impl NamespacedDocument {
    /// The file the document came from.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The token its resources were prefixed with.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The project name declared in the file, if any.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// The namespaced resources.
    #[must_use]
    pub fn resources(&self) -> &ProjectResources {
        &self.resources
    }

    /// Consumes the document, returning its resources.
    #[must_use]
    pub fn into_resources(self) -> ProjectResources {
        self.resources
    }
}

/// Renames a document's resources under a namespace token.
///
/// # Examples
///
/// ```
/// use qec::document::{Dependency, Document, ProjectResources, ServiceSpec};
/// use qec::merge::{MergeReport, ResourceNamespacer};
///
/// let mut resources = ProjectResources::default();
/// let mut frontend = ServiceSpec::default();
/// frontend.depends_on.insert("api".into(), Dependency::default());
/// resources.services.insert("frontend".into(), frontend);
/// resources.services.insert("api".into(), ServiceSpec::default());
///
/// let doc = Document::new("/srv/web/docker-compose.yml", resources).unwrap();
/// let namespacer = ResourceNamespacer::for_document(&doc).unwrap();
/// let namespaced = namespacer.apply(doc, &mut MergeReport::default());
///
/// let services = &namespaced.resources().services;
/// assert!(services.contains_key("web_api"));
/// assert!(services["web_frontend"].depends_on.contains_key("web_api"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNamespacer {
    token: String,
}

impl ResourceNamespacer {
    /// A namespacer using `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// A namespacer using the document's own token.
    ///
    /// # Errors
    ///
    /// Fails if the document's base directory has no usable final segment.
    pub fn for_document(document: &Document) -> Result<Self> {
        document.namespace_token().map(Self::new)
    }

    /// The namespace token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `token_name`.
    #[must_use]
    pub fn namespaced(&self, name: &str) -> String {
        format!("{}_{name}", self.token)
    }

    /// Builds the translation table for one category's keys.
    pub fn table<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> TranslationTable {
        TranslationTable {
            names: names
                .into_iter()
                .map(|name| (name.clone(), self.namespaced(name)))
                .collect(),
        }
    }

    /// Namespaces every resource of `document` and rewrites its references.
    pub fn apply(&self, document: Document, report: &mut MergeReport) -> NamespacedDocument {
        let Document {
            source_path,
            project_name,
            resources,
            unset_variables,
            ..
        } = document;
        let ProjectResources {
            services,
            volumes,
            networks,
            configs,
            secrets,
        } = resources;

        let tables = Tables {
            services: self.table(services.keys()),
            volumes: self.table(volumes.keys()),
            configs: self.table(configs.keys()),
            secrets: self.table(secrets.keys()),
        };

        let mut renamed = Services::new();
        for (name, mut spec) in services {
            let new_name = self.namespaced(&name);
            report.push(MergeEvent::ResourceRenamed {
                kind: ResourceKind::Service,
                from: name,
                to: new_name.clone(),
            });
            rewrite_references(&new_name, &mut spec, &tables, report);
            renamed.insert(new_name, spec);
        }

        NamespacedDocument {
            source_path,
            token: self.token.clone(),
            project_name,
            resources: ProjectResources {
                services: renamed,
                volumes: self.rename(volumes, ResourceKind::Volume, report),
                networks,
                configs: self.rename(configs, ResourceKind::Config, report),
                secrets: self.rename(secrets, ResourceKind::Secret, report),
            },
            unset_variables,
        }
    }

    fn rename<T: TopLevelResource>(
        &self,
        map: BTreeMap<String, T>,
        kind: ResourceKind,
        report: &mut MergeReport,
    ) -> BTreeMap<String, T> {
        map.into_iter()
            .map(|(name, mut spec)| {
                pin_external_name(spec.options_mut(), &name);
                let to = self.namespaced(&name);
                report.push(MergeEvent::ResourceRenamed {
                    kind,
                    from: name,
                    to: to.clone(),
                });
                (to, spec)
            })
            .collect()
    }
}

/// Top-level resources whose key is namespaced.
trait TopLevelResource {
    fn options_mut(&mut self) -> &mut Mapping;
}

impl TopLevelResource for VolumeSpec {
    fn options_mut(&mut self) -> &mut Mapping {
        &mut self.options
    }
}

impl TopLevelResource for FileResourceSpec {
    fn options_mut(&mut self) -> &mut Mapping {
        &mut self.options
    }
}

fn pin_external_name(options: &mut Mapping, original: &str) {
    let external = matches!(options.get("external"), Some(Value::Bool(true)));
    if external && !options.contains_key("name") {
        options.insert(Value::from("name"), Value::from(original));
    }
}

struct Tables {
    services: TranslationTable,
    volumes: TranslationTable,
    configs: TranslationTable,
    secrets: TranslationTable,
}

fn translate(
    table: &TranslationTable,
    service: &str,
    kind: ReferenceKind,
    target: &str,
    report: &mut MergeReport,
) -> Option<String> {
    if let Some(to) = table.get(target) {
        report.push(MergeEvent::ReferenceRewritten {
            service: service.to_string(),
            kind,
            from: target.to_string(),
            to: to.to_string(),
        });
        Some(to.to_string())
    } else {
        report.push(MergeEvent::ReferenceUnresolved {
            service: service.to_string(),
            kind,
            target: target.to_string(),
        });
        None
    }
}

fn rewrite_references(
    service: &str,
    spec: &mut ServiceSpec,
    tables: &Tables,
    report: &mut MergeReport,
) {
    let depends_on = mem::take(&mut spec.depends_on);
    for (target, dependency) in depends_on {
        let target = translate(&tables.services, service, ReferenceKind::DependsOn, &target, report)
            .unwrap_or(target);
        spec.depends_on.insert(target, dependency);
    }

    for link in &mut spec.links {
        let (target, alias) = match link.split_once(':') {
            Some((target, alias)) => (target, Some(alias)),
            None => (link.as_str(), None),
        };
        let Some(renamed) = translate(&tables.services, service, ReferenceKind::Link, target, report)
        else {
            continue;
        };
        let rewritten = match alias {
            Some(alias) => format!("{renamed}:{alias}"),
            None => renamed,
        };
        *link = rewritten;
    }

    for mount in &mut spec.volume_mounts {
        let MountSource::Named(volume) = mount.source() else {
            continue;
        };
        if let Some(renamed) =
            translate(&tables.volumes, service, ReferenceKind::VolumeMount, volume, report)
        {
            mount.set_source(&renamed);
        }
    }

    for reference in &mut spec.configs {
        if let Some(renamed) = translate(
            &tables.configs,
            service,
            ReferenceKind::Config,
            reference.source(),
            report,
        ) {
            reference.set_source(&renamed);
        }
    }

    for reference in &mut spec.secrets {
        if let Some(renamed) = translate(
            &tables.secrets,
            service,
            ReferenceKind::Secret,
            reference.source(),
            report,
        ) {
            reference.set_source(&renamed);
        }
    }
}
