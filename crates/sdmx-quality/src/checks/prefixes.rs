use sdmx_model::{Finding, QualityCheck};

use crate::graph::Graph;

pub(super) fn check(graph: &Graph) -> Vec<Finding> {
    let undeclared = graph.undeclared.iter().map(|name| {
        let prefix = name.split_once(':').map_or("", |(prefix, _)| prefix);
        Finding::new(
            QualityCheck::PrefixCoverage,
            name.clone(),
            format!("prefix '{prefix}' is not declared"),
        )
    });
    let uncovered = graph
        .iris()
        .into_iter()
        .filter(|iri| {
            !graph
                .prefixes
                .values()
                .any(|namespace| iri.starts_with(namespace.as_str()))
        })
        .map(|iri| {
            Finding::new(
                QualityCheck::PrefixCoverage,
                iri,
                "namespace has no prefix declaration",
            )
        });
    undeclared.chain(uncovered).collect()
}
