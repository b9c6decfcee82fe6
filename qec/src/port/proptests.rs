//! Property-based tests for `Port` and the conflict resolver.

use proptest::prelude::*;

use super::{Port, PortConflictResolver};
use crate::document::{ContainerPort, PortBinding, ServiceSpec, Services};
use crate::merge::MergeReport;

fn services_from(ports: &[(String, Vec<u16>)]) -> Services {
    ports
        .iter()
        .map(|(name, published)| {
            let spec = ServiceSpec {
                ports: published
                    .iter()
                    .map(|p| PortBinding::new(Some(&p.to_string()), 80))
                    .collect(),
                ..ServiceSpec::default()
            };
            (name.clone(), spec)
        })
        .collect()
}

fn arb_services() -> impl Strategy<Value = Vec<(String, Vec<u16>)>> {
    prop::collection::btree_map("[a-z]{1,6}", prop::collection::vec(1000u16..1010, 0..3), 1..6)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Valid published ports parse back to themselves
    #[test]
    fn parse_published_accepts_valid_ports(port in Port::MIN..=Port::MAX) {
        prop_assert_eq!(Port::parse_published(&port.to_string()).map(Port::value), Some(port));
    }

    // A successful resolution leaves no conflicts behind
    #[test]
    fn resolve_success_means_conflict_free(entries in arb_services(), offset in 1u16..500) {
        let mut services = services_from(&entries);
        let mut report = MergeReport::default();
        if PortConflictResolver::new(offset).resolve(&mut services, &mut report).is_ok() {
            prop_assert!(PortConflictResolver::detect(&services).is_empty());
        }
    }

    // The alphabetically first service in every conflict keeps its port
    #[test]
    fn resolve_first_service_keeps_port(entries in arb_services(), offset in 1u16..500) {
        let mut services = services_from(&entries);
        let before = PortConflictResolver::detect(&services);
        let original = services.clone();
        let mut report = MergeReport::default();
        if PortConflictResolver::new(offset).resolve(&mut services, &mut report).is_ok() {
            for (port, names) in before.iter() {
                let first = &names[0];
                let kept = services[first]
                    .ports
                    .iter()
                    .zip(&original[first].ports)
                    .filter(|(_, old)| old.published_port() == Some(port))
                    .all(|(new, old)| new.published == old.published);
                prop_assert!(kept);
            }
        }
    }

    // Resolution never changes container ports or the number of bindings
    #[test]
    fn resolve_preserves_binding_shape(entries in arb_services(), offset in 1u16..500) {
        let mut services = services_from(&entries);
        let original = services.clone();
        let mut report = MergeReport::default();
        let _ = PortConflictResolver::new(offset).resolve(&mut services, &mut report);
        for (name, spec) in &services {
            prop_assert_eq!(spec.ports.len(), original[name].ports.len());
            for binding in &spec.ports {
                prop_assert_eq!(binding.target, ContainerPort::Single(80));
            }
        }
    }
}
