//! Property-based tests for namespacing and merging.

use proptest::prelude::*;

use super::{ConfigMerger, MergeReport, ResourceNamespacer};
use crate::document::{Dependency, Document, ProjectResources, ServiceSpec};

fn arb_services() -> impl Strategy<Value = Vec<(String, Vec<usize>)>> {
    prop::collection::btree_map("[a-z]{1,8}", prop::collection::vec(0usize..8, 0..3), 1..8)
        .prop_map(|map| map.into_iter().collect())
}

/// Builds a document whose services depend on each other by index.
fn document(dir: &str, entries: &[(String, Vec<usize>)]) -> Document {
    let names: Vec<&String> = entries.iter().map(|(name, _)| name).collect();
    let mut resources = ProjectResources::default();
    for (name, deps) in entries {
        let mut spec = ServiceSpec::default();
        for dep in deps {
            let target = names.get(*dep).map_or_else(|| format!("ext{dep}"), |n| (*n).clone());
            spec.depends_on.insert(target, Dependency::default());
        }
        resources.services.insert(name.clone(), spec);
    }
    Document::new(format!("/stack/{dir}/docker-compose.yml"), resources).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    // Disjoint namespacing keeps every service
    #[test]
    fn merged_service_count_is_sum(left in arb_services(), right in arb_services()) {
        let outcome = ConfigMerger::default()
            .merge(vec![document("left", &left), document("right", &right)])
            .unwrap();
        prop_assert_eq!(outcome.project.services().len(), left.len() + right.len());
    }

    // Every internal dependency points at the namespaced target
    #[test]
    fn dependencies_follow_renames(entries in arb_services()) {
        let doc = document("web", &entries);
        let original = doc.resources().services.clone();
        let namespaced = ResourceNamespacer::new("web").apply(doc, &mut MergeReport::default());

        for (name, spec) in &original {
            let renamed = &namespaced.resources().services[&format!("web_{name}")];
            for target in spec.depends_on.keys() {
                let expected = if original.contains_key(target) {
                    format!("web_{target}")
                } else {
                    target.clone()
                };
                prop_assert!(renamed.depends_on.contains_key(&expected));
            }
        }
    }

    // Every key carries the token
    #[test]
    fn every_key_is_prefixed(entries in arb_services()) {
        let namespaced = ResourceNamespacer::new("tok")
            .apply(document("tok", &entries), &mut MergeReport::default());
        for name in namespaced.resources().services.keys() {
            prop_assert!(name.starts_with("tok_"));
        }
    }
}
