//! Quality report types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural checks, in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCheck {
    /// Every namespace used by an IRI has a prefix declaration.
    PrefixCoverage,
    /// Every concept has at least one label.
    ConceptLabels,
    /// Every concept belongs to exactly one declared scheme.
    SchemeMembership,
    /// Every exact-match subject is a concept of the same document.
    ExactMatchTargets,
}

impl QualityCheck {
    pub const ALL: [QualityCheck; 4] = [
        Self::PrefixCoverage,
        Self::ConceptLabels,
        Self::SchemeMembership,
        Self::ExactMatchTargets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrefixCoverage => "prefix_coverage",
            Self::ConceptLabels => "concept_labels",
            Self::SchemeMembership => "scheme_membership",
            Self::ExactMatchTargets => "exact_match_targets",
        }
    }
}

impl fmt::Display for QualityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violation found by a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check: QualityCheck,
    /// Offending IRI, or the document id when the document could not be read.
    pub uri: String,
    pub message: String,
}

impl Finding {
    pub fn new(check: QualityCheck, uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check,
            uri: uri.into(),
            message: message.into(),
        }
    }
}

/// Informational counts. Never part of the rating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub triples: usize,
    pub subjects: usize,
    pub predicates: usize,
    pub objects: usize,
    pub notations: usize,
    pub external_links: usize,
    pub unused_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub document_id: String,
    /// Fraction of passing checks, `0.0..=1.0`.
    pub rating: f64,
    pub findings: Vec<Finding>,
    pub metrics: QualityMetrics,
}

impl QualityReport {
    pub fn new(
        document_id: impl Into<String>,
        findings: Vec<Finding>,
        metrics: QualityMetrics,
    ) -> Self {
        let failed = QualityCheck::ALL
            .iter()
            .filter(|check| findings.iter().any(|finding| finding.check == **check))
            .count();
        let total = QualityCheck::ALL.len();
        Self {
            document_id: document_id.into(),
            rating: (total - failed) as f64 / total as f64,
            findings,
            metrics,
        }
    }

    /// Report for a document that could not be parsed: every check fails.
    pub fn unreadable(document_id: impl Into<String>, reason: &str) -> Self {
        let document_id = document_id.into();
        let findings = QualityCheck::ALL
            .iter()
            .map(|check| Finding::new(*check, document_id.clone(), reason))
            .collect();
        Self::new(document_id, findings, QualityMetrics::default())
    }

    pub fn failed_checks(&self) -> Vec<QualityCheck> {
        QualityCheck::ALL
            .into_iter()
            .filter(|check| self.findings.iter().any(|finding| finding.check == *check))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Row of the organization-label audit table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRow {
    pub owning_organization: String,
    pub list_id: String,
    pub display_name: String,
}
