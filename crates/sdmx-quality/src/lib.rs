//! Quality checker for generated SKOS documents.
//!
//! Documents are re-read from disk with [`Graph::parse`] and scored by the
//! four structural checks in [`checks::run_all`]. Every report is a
//! read-only diagnostic; a document that cannot be parsed gets a zero rating
//! rather than an error.

pub mod audit;
pub mod checks;
pub mod graph;
pub mod metrics;

use std::path::{Path, PathBuf};
use std::time::Instant;

use sdmx_model::{CodelistError, QualityReport, Result, write_atomic};

pub use audit::{AUDIT_COLUMNS, audit_lists, write_audit_table};
pub use graph::{Graph, ParseError, Term, Triple};
pub use metrics::compute_metrics;

pub const QUALITY_REPORT: &str = "quality.json";

/// Score already-parsed `graph`.
pub fn check_graph(document_id: &str, graph: &Graph) -> QualityReport {
    QualityReport::new(document_id, checks::run_all(graph), compute_metrics(graph))
}

pub fn check_text(document_id: &str, text: &str) -> QualityReport {
    match Graph::parse(text) {
        Ok(graph) => check_graph(document_id, &graph),
        Err(err) => {
            tracing::warn!(document = document_id, error = %err, "document could not be parsed");
            QualityReport::unreadable(document_id, &err.to_string())
        }
    }
}

/// Check the document at `path`; its id is the file stem.
pub fn check_document(path: &Path) -> QualityReport {
    let start = Instant::now();
    let document_id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let report = match std::fs::read_to_string(path) {
        Ok(text) => check_text(&document_id, &text),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "document could not be read");
            QualityReport::unreadable(&document_id, &err.to_string())
        }
    };
    tracing::info!(
        document = %report.document_id,
        rating = report.rating,
        findings = report.findings.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "checked document"
    );
    report
}

pub fn check_documents<I>(paths: I) -> Vec<QualityReport>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    paths
        .into_iter()
        .map(|path| check_document(path.as_ref()))
        .collect()
}

/// Write all reports as one pretty-printed JSON array.
pub fn write_reports(path: &Path, reports: &[QualityReport]) -> Result<PathBuf> {
    let json =
        serde_json::to_vec_pretty(reports).map_err(|e| CodelistError::write(path, e.into()))?;
    write_atomic(path, &json)
}
