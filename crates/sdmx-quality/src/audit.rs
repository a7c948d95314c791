//! Audit of code lists whose owning organization has no label.

use std::path::{Path, PathBuf};

use sdmx_analysis::write_table;
use sdmx_model::{AuditRow, CodeListRecord, Result};
use sdmx_rdf::OrganizationRegistry;

pub const AUDIT_COLUMNS: [&str; 3] = ["owning_organization", "list_id", "display_name"];

/// Filtered code lists without a scheme-level organization label.
pub fn audit_lists(
    lists: &[CodeListRecord],
    organizations: &OrganizationRegistry,
) -> Vec<AuditRow> {
    lists
        .iter()
        .filter(|list| organizations.label(&list.owning_organization).is_none())
        .map(|list| {
            tracing::debug!(
                organization = %list.owning_organization,
                list_id = %list.list_id,
                "code list has no organization label"
            );
            AuditRow {
                owning_organization: list.owning_organization.clone(),
                list_id: list.list_id.clone(),
                display_name: list.display_name.clone(),
            }
        })
        .collect()
}

pub fn write_audit_table(path: &Path, rows: &[AuditRow]) -> Result<PathBuf> {
    write_table(path, &AUDIT_COLUMNS, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unlabelled_organizations_are_audited() {
        let lists = vec![
            CodeListRecord::new("ESTAT", "CL_FREQ", "Frequency"),
            CodeListRecord::new("ACME", "CL_WIDGET", "Widgets"),
        ];
        let rows = audit_lists(&lists, &OrganizationRegistry::with_builtin());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].owning_organization, "ACME");
        assert_eq!(rows[0].display_name, "Widgets");
    }
}
