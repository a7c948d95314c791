//! Structural checks over a parsed document.
//!
//! Each module implements one [`QualityCheck`]; [`run_all`] evaluates them
//! in rating order.

mod exact_match;
mod labels;
mod membership;
mod prefixes;

use sdmx_model::Finding;
use sdmx_rdf::document::SKOS;

use crate::graph::Graph;

/// Run every check, in order, and collect their findings.
pub fn run_all(graph: &Graph) -> Vec<Finding> {
    let mut findings = Vec::new();

    // 1. Every IRI namespace is declared
    findings.extend(prefixes::check(graph));

    // 2. Every concept has a label
    findings.extend(labels::check(graph));

    // 3. Every concept sits in exactly one declared scheme
    findings.extend(membership::check(graph));

    // 4. Exact-match links start from local concepts
    findings.extend(exact_match::check(graph));

    findings
}

pub(crate) fn skos(term: &str) -> String {
    format!("{}{term}", SKOS.1)
}
