use sdmx_model::{Finding, QualityCheck};

use super::skos;
use crate::graph::Graph;

pub(super) fn check(graph: &Graph) -> Vec<Finding> {
    let pref_label = skos("prefLabel");
    graph
        .instances_of(&skos("Concept"))
        .into_iter()
        .filter(|concept| graph.objects(concept, &pref_label).next().is_none())
        .map(|concept| Finding::new(QualityCheck::ConceptLabels, concept, "concept has no label"))
        .collect()
}
