//! Data model shared by every stage of the code-list pipeline.
//!
//! - [`SourceRow`]: one registry entry pointing at a source document
//! - [`CodeRecord`] / [`CodeListRecord`]: the flat tabular model produced by
//!   the flattener and consumed by the aggregator and the generator
//! - [`AgencyGroup`]: reporting view over code lists sharing an organization
//! - [`QualityReport`] / [`AuditRow`]: quality checker outputs
//! - [`AtomicFile`]: scoped writes shared by every stage that produces files

pub mod atomic;
pub mod codelist;
pub mod error;
pub mod ids;
pub mod quality;
pub mod source;

pub use atomic::{AtomicFile, write_atomic};
pub use codelist::{AgencyGroup, CodeListRecord, CodeRecord, CodeStatistics, Labels};
pub use error::{CodelistError, Result};
pub use ids::{SourceKey, match_key, normalize_component};
pub use quality::{AuditRow, Finding, QualityCheck, QualityMetrics, QualityReport};
pub use source::SourceRow;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_report_rating_counts_failed_checks() {
        let report = QualityReport::new(
            "sip-sdmx-code-estat-cl_freq",
            vec![
                Finding::new(QualityCheck::ConceptLabels, "https://x/a", "no label"),
                Finding::new(QualityCheck::ConceptLabels, "https://x/b", "no label"),
            ],
            QualityMetrics::default(),
        );
        assert_eq!(report.rating, 0.75);
        assert_eq!(report.failed_checks(), vec![QualityCheck::ConceptLabels]);
        assert!(!report.is_clean());
    }

    #[test]
    fn source_key_is_case_and_whitespace_insensitive() {
        let a = SourceKey::new("ESTAT", "CL_FREQ");
        let b = SourceKey::new(" estat ", "cl_freq");
        assert_eq!(a, b);
    }
}
