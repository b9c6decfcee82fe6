//! Combining namespaced documents into one project.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::{Document, ProjectResources, Services};
use crate::error::{Error, Result};
use crate::merge::namespace::{NamespacedDocument, ResourceNamespacer};
use crate::merge::report::{MergeEvent, MergeReport, ResourceKind};
use crate::path::PathResolver;
use crate::port::{PortConflictResolver, DEFAULT_PORT_OFFSET};

/// What to do when two documents share a namespace token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Refuse to merge.
    #[default]
    Fail,
    /// Later documents overwrite earlier definitions of the same key.
    Overwrite,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(format!("invalid collision policy '{s}' (expected fail or overwrite)")),
        }
    }
}

/// Options for [`ConfigMerger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Distance between reassigned host ports.
    pub port_offset: u16,
    /// Handling of duplicate namespace tokens.
    pub collision_policy: CollisionPolicy,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            port_offset: DEFAULT_PORT_OFFSET,
            collision_policy: CollisionPolicy::Fail,
        }
    }
}

/// The merged compose project.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedProject {
    /// Project name, taken from the first document that declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The unioned resources.
    #[serde(flatten)]
    pub resources: ProjectResources,
}

impl MergedProject {
    /// The merged services.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.resources.services
    }

    /// Renders the project as a compose file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// A merged project and what happened while producing it.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The merged project.
    pub project: MergedProject,
    /// Events recorded during the merge.
    pub report: MergeReport,
}

/// Merges compose documents from different directories.
///
/// Each document has its relative paths rooted, then its resources prefixed
/// with the name of its directory. The results are unioned and host port
/// collisions are resolved last.
///
/// # Examples
///
/// ```
/// use qec::document::{Document, PortBinding, ProjectResources, ServiceSpec};
/// use qec::merge::ConfigMerger;
///
/// let doc = |dir: &str| {
///     let mut resources = ProjectResources::default();
///     let mut web = ServiceSpec::default();
///     web.ports.push(PortBinding::new(Some("80"), 80));
///     resources.services.insert("web".into(), web);
///     Document::new(format!("/srv/{dir}/docker-compose.yml"), resources).unwrap()
/// };
///
/// let outcome = ConfigMerger::default().merge(vec![doc("a"), doc("b")]).unwrap();
/// let services = outcome.project.services();
/// assert_eq!(services["a_web"].ports[0].published.as_deref(), Some("80"));
/// assert_eq!(services["b_web"].ports[0].published.as_deref(), Some("180"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    options: MergeOptions,
    path_resolver: PathResolver,
}

impl ConfigMerger {
    /// A merger with the given options.
    #[must_use]
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            path_resolver: PathResolver::new(),
        }
    }

    /// Uses a custom path resolver.
    #[must_use]
    pub fn with_path_resolver(mut self, resolver: PathResolver) -> Self {
        self.path_resolver = resolver;
        self
    }

    /// The merge options.
    #[must_use]
    pub const fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merges `documents` in order.
    ///
    /// Nothing is returned unless every step succeeds.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `documents` is empty.
    /// - [`Error::PathResolution`] if a document's paths cannot be rooted or
    ///   its directory yields no namespace token.
    /// - [`Error::DuplicateNamespace`] if two documents share a token under
    ///   [`CollisionPolicy::Fail`].
    /// - [`Error::UnresolvableConflict`] or [`Error::PortOutOfRange`] from
    ///   port conflict resolution.
    pub fn merge(&self, documents: Vec<Document>) -> Result<MergeOutcome> {
        if documents.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut report = MergeReport::default();
        let mut namespaced = Vec::with_capacity(documents.len());
        for document in documents {
            for variable in document.unset_variables() {
                report.push(MergeEvent::VariableUnset {
                    document: document.source_path().to_path_buf(),
                    variable: variable.clone(),
                });
            }
            let document = self.path_resolver.resolve(document, &mut report)?;
            let namespacer = ResourceNamespacer::for_document(&document)?;
            namespaced.push(namespacer.apply(document, &mut report));
        }

        if self.options.collision_policy == CollisionPolicy::Fail {
            check_unique_tokens(&namespaced)?;
        }

        let mut documents = namespaced.into_iter();
        let Some(first) = documents.next() else {
            return Err(Error::EmptyInput);
        };
        let mut project = MergedProject {
            name: first.project_name.clone(),
            resources: first.into_resources(),
        };

        for document in documents {
            if project.name.is_none() {
                project.name = document.project_name.clone();
            }
            let source = document.source_path.clone();
            union_into(&mut project.resources, document.into_resources(), &source, &mut report);
        }

        PortConflictResolver::new(self.options.port_offset)
            .resolve(&mut project.resources.services, &mut report)?;

        Ok(MergeOutcome { project, report })
    }
}

fn check_unique_tokens(documents: &[NamespacedDocument]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for document in documents {
        if let Some(first) = seen.insert(document.token(), document.source_path()) {
            return Err(Error::DuplicateNamespace {
                token: document.token().to_string(),
                first: first.to_path_buf(),
                second: document.source_path().to_path_buf(),
            });
        }
    }
    Ok(())
}

fn union_into(
    target: &mut ProjectResources,
    source: ProjectResources,
    document: &Path,
    report: &mut MergeReport,
) {
    union_map(&mut target.services, source.services, ResourceKind::Service, document, report);
    union_map(&mut target.volumes, source.volumes, ResourceKind::Volume, document, report);
    union_map(&mut target.configs, source.configs, ResourceKind::Config, document, report);
    union_map(&mut target.secrets, source.secrets, ResourceKind::Secret, document, report);
    // Networks are shared by name; the last definition wins.
    target.networks.extend(source.networks);
}

fn union_map<T>(
    target: &mut BTreeMap<String, T>,
    source: BTreeMap<String, T>,
    kind: ResourceKind,
    document: &Path,
    report: &mut MergeReport,
) {
    for (name, spec) in source {
        match target.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(spec);
            }
            Entry::Occupied(mut slot) => {
                report.push(MergeEvent::NamespaceOverwritten {
                    kind,
                    name: slot.key().clone(),
                    document: PathBuf::from(document),
                });
                slot.insert(spec);
            }
        }
    }
}
