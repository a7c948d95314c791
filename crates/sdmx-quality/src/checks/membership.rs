use sdmx_model::{Finding, QualityCheck};

use super::skos;
use crate::graph::Graph;

pub(super) fn check(graph: &Graph) -> Vec<Finding> {
    let schemes = graph.instances_of(&skos("ConceptScheme"));
    let in_scheme = skos("inScheme");
    let mut findings = Vec::new();
    for concept in graph.instances_of(&skos("Concept")) {
        let targets: Vec<_> = graph.objects(concept, &in_scheme).collect();
        match targets.len() {
            0 => findings.push(Finding::new(
                QualityCheck::SchemeMembership,
                concept,
                "concept belongs to no scheme",
            )),
            1 => {}
            n => findings.push(Finding::new(
                QualityCheck::SchemeMembership,
                concept,
                format!("concept belongs to {n} schemes"),
            )),
        }
        for target in targets {
            if !target.as_iri().is_some_and(|iri| schemes.contains(iri)) {
                findings.push(Finding::new(
                    QualityCheck::SchemeMembership,
                    concept,
                    format!("scheme {target} is not declared in this document"),
                ));
            }
        }
    }
    findings
}
