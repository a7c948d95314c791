//! Informational counts reported next to the rating.

use std::collections::BTreeSet;

use sdmx_model::QualityMetrics;
use sdmx_rdf::document::{RDFS, SKOS};

use crate::graph::{Graph, Term};

pub fn compute_metrics(graph: &Graph) -> QualityMetrics {
    let notation = format!("{}notation", SKOS.1);
    let exact_match = format!("{}exactMatch", SKOS.1);
    let see_also = format!("{}seeAlso", RDFS.1);

    let subjects: BTreeSet<&str> = graph.triples.iter().map(|t| t.subject.as_str()).collect();
    let predicates: BTreeSet<&str> = graph.triples.iter().map(|t| t.predicate.as_str()).collect();
    let objects: BTreeSet<&Term> = graph.triples.iter().map(|t| &t.object).collect();
    let notations: BTreeSet<&str> = graph
        .with_predicate(&notation)
        .filter_map(|t| match &t.object {
            Term::Literal { value, .. } => Some(value.as_str()),
            _ => None,
        })
        .collect();
    let external_links = graph
        .triples
        .iter()
        .filter(|t| t.predicate == exact_match || t.predicate == see_also)
        .count();

    QualityMetrics {
        triples: graph.triples.len(),
        subjects: subjects.len(),
        predicates: predicates.len(),
        objects: objects.len(),
        notations: notations.len(),
        external_links,
        unused_prefixes: unused_prefixes(graph),
    }
}

/// Declared prefixes whose namespace no IRI in the document falls under.
fn unused_prefixes(graph: &Graph) -> Vec<String> {
    let iris = graph.iris();
    let datatypes: Vec<&str> = graph
        .triples
        .iter()
        .filter_map(|t| match &t.object {
            Term::Literal {
                datatype: Some(datatype),
                ..
            } => Some(datatype.as_str()),
            _ => None,
        })
        .collect();
    graph
        .prefixes
        .iter()
        .filter(|(_, namespace)| {
            !iris
                .iter()
                .chain(&datatypes)
                .any(|iri| iri.starts_with(namespace.as_str()))
        })
        .map(|(prefix, _)| prefix.clone())
        .collect()
}
