//! Host port conflict detection and fixed-offset resolution.
//!
//! Within each conflict, services are ordered by name. The first service
//! keeps its port; the service at position `i` moves to `port + offset * i`.
//! The strategy never searches for alternatives: if a shifted port is
//! already claimed, resolution fails.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::document::{Protocol, Services};
use crate::error::{Error, Result};
use crate::merge::{MergeEvent, MergeReport};
use crate::port::Port;

/// Default distance between reassigned host ports.
pub const DEFAULT_PORT_OFFSET: u16 = 100;

/// A binding whose published port could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBinding {
    /// The service declaring the binding.
    pub service: String,
    /// The published value as written.
    pub published: String,
}

/// Host ports published by more than one service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet {
    conflicts: BTreeMap<Port, Vec<String>>,
    skipped: Vec<SkippedBinding>,
}

impl ConflictSet {
    /// Returns true if no host port is shared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of shared host ports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Services sharing `port`, sorted by name.
    #[must_use]
    pub fn get(&self, port: Port) -> Option<&[String]> {
        self.conflicts.get(&port).map(Vec::as_slice)
    }

    /// Iterates conflicts in ascending port order.
    pub fn iter(&self) -> impl Iterator<Item = (Port, &[String])> {
        self.conflicts
            .iter()
            .map(|(port, names)| (*port, names.as_slice()))
    }

    /// Position of `service` within the conflict on `port`.
    #[must_use]
    pub fn position(&self, port: Port, service: &str) -> Option<usize> {
        self.conflicts
            .get(&port)?
            .iter()
            .position(|name| name == service)
    }

    /// Bindings excluded from analysis because their host port did not parse.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedBinding] {
        &self.skipped
    }
}

/// Resolves host port collisions with a fixed offset.
///
/// # Examples
///
/// ```
/// use qec::document::{PortBinding, ServiceSpec, Services};
/// use qec::merge::MergeReport;
/// use qec::PortConflictResolver;
///
/// let mut services = Services::new();
/// for name in ["web", "app"] {
///     let mut spec = ServiceSpec::default();
///     spec.ports.push(PortBinding::new(Some("80"), 80));
///     services.insert(name.to_string(), spec);
/// }
///
/// let mut report = MergeReport::default();
/// PortConflictResolver::default().resolve(&mut services, &mut report).unwrap();
///
/// assert_eq!(services["app"].ports[0].published.as_deref(), Some("80"));
/// assert_eq!(services["web"].ports[0].published.as_deref(), Some("180"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConflictResolver {
    offset: u16,
}

impl Default for PortConflictResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PORT_OFFSET)
    }
}

impl PortConflictResolver {
    /// Creates a resolver with the given offset.
    #[must_use]
    pub const fn new(offset: u16) -> Self {
        Self { offset }
    }

    /// The configured offset.
    #[must_use]
    pub const fn offset(&self) -> u16 {
        self.offset
    }

    /// Finds every host port published by two or more distinct services.
    ///
    /// Unpublished bindings are ignored. Bindings whose host port does not
    /// parse are listed in [`ConflictSet::skipped`].
    #[must_use]
    pub fn detect(services: &Services) -> ConflictSet {
        let mut owners: BTreeMap<Port, BTreeSet<&str>> = BTreeMap::new();
        let mut skipped = Vec::new();

        for (name, service) in services {
            for binding in &service.ports {
                let Some(published) = binding.published.as_deref() else {
                    continue;
                };
                if published.trim().is_empty() {
                    continue;
                }
                match Port::parse_published(published) {
                    Some(port) => {
                        owners.entry(port).or_default().insert(name.as_str());
                    }
                    None => skipped.push(SkippedBinding {
                        service: name.clone(),
                        published: published.to_string(),
                    }),
                }
            }
        }

        let conflicts = owners
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(port, names)| (port, names.into_iter().map(str::to_string).collect()))
            .collect();

        ConflictSet { conflicts, skipped }
    }

    /// Reassigns conflicting bindings in place.
    ///
    /// Services are visited in name order. A binding on a conflicting port
    /// moves by `offset * position`; position 0 keeps its port. Claims are
    /// per port and protocol, so one service may publish the same host port
    /// for tcp and udp, but no binding may land on a claimed pair.
    ///
    /// # Errors
    ///
    /// - [`Error::PortOutOfRange`] if a shifted port would exceed 65535.
    /// - [`Error::UnresolvableConflict`] if a shifted port is already claimed
    ///   by any binding, or if conflicts remain after reassignment.
    pub fn resolve(&self, services: &mut Services, report: &mut MergeReport) -> Result<()> {
        let conflicts = Self::detect(services);

        for skipped in conflicts.skipped() {
            report.push(MergeEvent::BindingSkipped {
                service: skipped.service.clone(),
                published: skipped.published.clone(),
            });
        }
        if conflicts.is_empty() {
            return Ok(());
        }
        for (port, names) in conflicts.iter() {
            report.push(MergeEvent::PortConflictDetected {
                port: port.value(),
                services: names.to_vec(),
            });
        }

        let mut claimed: HashMap<(Port, Protocol), String> = HashMap::new();

        for (name, service) in services.iter_mut() {
            for binding in &mut service.ports {
                let Some(port) = binding.published_port() else {
                    continue;
                };
                let Some(index) = conflicts.position(port, name) else {
                    continue;
                };

                let new_port = port
                    .shifted(self.offset, index)
                    .ok_or_else(|| Error::PortOutOfRange {
                        service: name.clone(),
                        port: port.value(),
                        offset: self.offset,
                        index,
                    })?;

                let key = (new_port, binding.protocol);
                if let Some(owner) = claimed.get(&key) {
                    return Err(Error::UnresolvableConflict {
                        port: new_port.value(),
                        details: format!(
                            "port {new_port}/{} is already in use after applying offset \
                             (claimed by {owner}, needed by {name})",
                            binding.protocol
                        ),
                    });
                }

                if new_port != port {
                    binding.published = Some(new_port.to_string());
                    report.push(MergeEvent::PortReassigned {
                        service: name.clone(),
                        from: port.value(),
                        to: new_port.value(),
                    });
                }
                claimed.insert(key, name.clone());
            }
        }

        let remaining = Self::detect(services);
        if let Some((port, names)) = remaining.iter().next() {
            return Err(Error::UnresolvableConflict {
                port: port.value(),
                details: format!(
                    "unable to resolve all port conflicts: still published by {}",
                    names.join(", ")
                ),
            });
        }

        Ok(())
    }
}
