use std::collections::BTreeMap;
use std::path::PathBuf;

use sdmx_model::QualityReport;

/// Counts and outputs of one pipeline run, filled in stage by stage.
///
/// A run that stops on a fatal error keeps what the finished stages recorded.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total_sources: usize,
    pub duplicate_sources: usize,
    pub incomplete_sources: usize,
    pub retrieved: usize,
    pub retrieval_failures: usize,
    pub missing_documents: usize,
    pub malformed_documents: usize,
    pub flattened: usize,
    /// Exclusion reason to number of excluded codes or lists.
    pub filtered_out: BTreeMap<String, usize>,
    pub filtered_lists: usize,
    pub filtered_codes: usize,
    pub agency_groups: usize,
    pub generated_documents: usize,
    pub generation_failures: usize,
    pub prefix_conflicts: Vec<String>,
    pub combined_document: Option<PathBuf>,
    pub reports: Vec<QualityReport>,
    pub quality_report: Option<PathBuf>,
    pub audit_rows: usize,
    pub audit_table: Option<PathBuf>,
    /// Recoverable problems, in the order they were met.
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn mean_rating(&self) -> Option<f64> {
        if self.reports.is_empty() {
            return None;
        }
        let total: f64 = self.reports.iter().map(|report| report.rating).sum();
        Some(total / self.reports.len() as f64)
    }

    pub fn clean_documents(&self) -> usize {
        self.reports.iter().filter(|report| report.is_clean()).count()
    }
}
