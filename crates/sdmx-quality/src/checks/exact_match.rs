use std::collections::BTreeSet;

use sdmx_model::{Finding, QualityCheck};

use super::skos;
use crate::graph::Graph;

pub(super) fn check(graph: &Graph) -> Vec<Finding> {
    let concepts = graph.instances_of(&skos("Concept"));
    let exact_match = skos("exactMatch");
    let dangling: BTreeSet<&str> = graph
        .with_predicate(&exact_match)
        .map(|triple| triple.subject.as_str())
        .filter(|subject| !concepts.contains(subject))
        .collect();
    dangling
        .into_iter()
        .map(|subject| {
            Finding::new(
                QualityCheck::ExactMatchTargets,
                subject,
                "exact-match link from a resource that is not a concept of this document",
            )
        })
        .collect()
}
