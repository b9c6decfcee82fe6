//! Structured diagnostics produced by a merge run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// How loudly an event should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine detail.
    Debug,
    /// A change the user probably wants to know about.
    Info,
    /// Something that may not be what the user intended.
    Warning,
}

/// A namespaced resource category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Services.
    Service,
    /// Named volumes.
    Volume,
    /// Configs.
    Config,
    /// Secrets.
    Secret,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Volume => write!(f, "volume"),
            Self::Config => write!(f, "config"),
            Self::Secret => write!(f, "secret"),
        }
    }
}

/// The field a cross-reference lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// A `depends_on` key.
    DependsOn,
    /// A `links` entry.
    Link,
    /// A named-volume mount source.
    VolumeMount,
    /// A service `configs` entry.
    Config,
    /// A service `secrets` entry.
    Secret,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependsOn => write!(f, "depends_on"),
            Self::Link => write!(f, "link"),
            Self::VolumeMount => write!(f, "volume mount"),
            Self::Config => write!(f, "config"),
            Self::Secret => write!(f, "secret"),
        }
    }
}

/// One thing that happened during a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MergeEvent {
    /// A variable referenced by a document was not set.
    VariableUnset {
        /// The document.
        document: PathBuf,
        /// The variable name.
        variable: String,
    },

    /// A relative build context was made absolute.
    BuildContextResolved {
        /// The owning service (document-local name).
        service: String,
        /// The context as written.
        from: String,
        /// The absolute context.
        to: String,
    },

    /// A bind mount or resource file path was made absolute.
    PathResolved {
        /// The service or resource owning the path.
        owner: String,
        /// The path as written.
        from: String,
        /// The absolute path.
        to: String,
    },

    /// A resource key was prefixed with its namespace token.
    ResourceRenamed {
        /// The resource category.
        kind: ResourceKind,
        /// Document-local name.
        from: String,
        /// Namespaced name.
        to: String,
    },

    /// A cross-reference was rewritten to a namespaced name.
    ReferenceRewritten {
        /// The service holding the reference (namespaced name).
        service: String,
        /// Where the reference lives.
        kind: ReferenceKind,
        /// The name as written.
        from: String,
        /// The namespaced name.
        to: String,
    },

    /// A cross-reference named nothing defined in its document.
    ReferenceUnresolved {
        /// The service holding the reference (namespaced name).
        service: String,
        /// Where the reference lives.
        kind: ReferenceKind,
        /// The unresolved name, left unchanged.
        target: String,
    },

    /// Two documents defined the same namespaced key; the later one won.
    NamespaceOverwritten {
        /// The resource category.
        kind: ResourceKind,
        /// The overwritten key.
        name: String,
        /// The document whose definition won.
        document: PathBuf,
    },

    /// A host port is published by several services.
    PortConflictDetected {
        /// The host port.
        port: u16,
        /// The services, in resolution order.
        services: Vec<String>,
    },

    /// A binding was moved to a new host port.
    PortReassigned {
        /// The service.
        service: String,
        /// The original host port.
        from: u16,
        /// The new host port.
        to: u16,
    },

    /// A binding was left out of conflict analysis.
    BindingSkipped {
        /// The service.
        service: String,
        /// The published value as written.
        published: String,
    },
}

impl MergeEvent {
    /// Severity used when rendering the event.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::VariableUnset { .. }
            | Self::NamespaceOverwritten { .. }
            | Self::PortConflictDetected { .. }
            | Self::BindingSkipped { .. } => Severity::Warning,
            Self::PortReassigned { .. } => Severity::Info,
            Self::BuildContextResolved { .. }
            | Self::PathResolved { .. }
            | Self::ResourceRenamed { .. }
            | Self::ReferenceRewritten { .. }
            | Self::ReferenceUnresolved { .. } => Severity::Debug,
        }
    }

    /// Returns a human-readable description of the event.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::VariableUnset { document, variable } => format!(
                "The \"{variable}\" variable is not set in {}. Defaulting to a blank string.",
                document.display()
            ),
            Self::BuildContextResolved { service, from, to } => {
                format!("Resolved build context of {service}: {from} -> {to}")
            }
            Self::PathResolved { owner, from, to } => {
                format!("Resolved path for {owner}: {from} -> {to}")
            }
            Self::ResourceRenamed { kind, from, to } => {
                format!("Renamed {kind} {from} -> {to}")
            }
            Self::ReferenceRewritten {
                service,
                kind,
                from,
                to,
            } => format!("Rewrote {kind} reference in {service}: {from} -> {to}"),
            Self::ReferenceUnresolved {
                service,
                kind,
                target,
            } => format!("{kind} reference '{target}' in {service} is not defined in its file; left unchanged"),
            Self::NamespaceOverwritten {
                kind,
                name,
                document,
            } => format!(
                "{kind} {name} is defined twice; keeping the definition from {}",
                document.display()
            ),
            Self::PortConflictDetected { port, services } => format!(
                "Port conflict detected: port {port} is used by services: {}",
                services.join(", ")
            ),
            Self::PortReassigned { service, from, to } => {
                format!("Adjusting port for service {service} from {from} to {to}")
            }
            Self::BindingSkipped { service, published } => format!(
                "Failed to parse host port '{published}' for service {service}; excluded from conflict checks"
            ),
        }
    }
}

/// Ordered events recorded during one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MergeReport {
    events: Vec<MergeEvent>,
}

impl MergeReport {
    /// Appends an event.
    pub fn push(&mut self, event: MergeEvent) {
        self.events.push(event);
    }

    /// All events, in the order they happened.
    #[must_use]
    pub fn events(&self) -> &[MergeEvent] {
        &self.events
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events at `Warning` severity.
    pub fn warnings(&self) -> impl Iterator<Item = &MergeEvent> {
        self.events
            .iter()
            .filter(|e| e.severity() == Severity::Warning)
    }

    /// Port reassignments as `(service, from, to)`.
    pub fn reassignments(&self) -> impl Iterator<Item = (&str, u16, u16)> {
        self.events.iter().filter_map(|e| match e {
            MergeEvent::PortReassigned { service, from, to } => Some((service.as_str(), *from, *to)),
            _ => None,
        })
    }
}

impl Extend<MergeEvent> for MergeReport {
    fn extend<I: IntoIterator<Item = MergeEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        let reassigned = MergeEvent::PortReassigned {
            service: "b_web".into(),
            from: 80,
            to: 180,
        };
        assert_eq!(reassigned.severity(), Severity::Info);

        let unset = MergeEvent::VariableUnset {
            document: PathBuf::from("/srv/web/docker-compose.yml"),
            variable: "TAG".into(),
        };
        assert_eq!(unset.severity(), Severity::Warning);
        assert!(unset.description().contains("\"TAG\""));
    }

    #[test]
    fn test_conflict_description_lists_services() {
        let event = MergeEvent::PortConflictDetected {
            port: 80,
            services: vec!["a_web".into(), "b_web".into()],
        };
        assert_eq!(
            event.description(),
            "Port conflict detected: port 80 is used by services: a_web, b_web"
        );
    }

    #[test]
    fn test_report_filters() {
        let mut report = MergeReport::default();
        assert!(report.is_empty());
        report.push(MergeEvent::PortConflictDetected {
            port: 443,
            services: vec!["a".into(), "b".into()],
        });
        report.push(MergeEvent::PortReassigned {
            service: "b".into(),
            from: 443,
            to: 543,
        });
        assert_eq!(report.len(), 2);
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.reassignments().collect::<Vec<_>>(), [("b", 443, 543)]);
    }

    #[test]
    fn test_report_serializes_as_tagged_list() {
        let mut report = MergeReport::default();
        report.push(MergeEvent::ResourceRenamed {
            kind: ResourceKind::Volume,
            from: "data".into(),
            to: "db_data".into(),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[0]["event"], "resource_renamed");
        assert_eq!(json[0]["kind"], "volume");
        assert_eq!(json[0]["to"], "db_data");
    }
}
