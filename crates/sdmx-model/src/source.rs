use serde::{Deserialize, Serialize};

use crate::ids::SourceKey;

/// One row of the code-list source registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub owning_organization: String,
    pub list_id: String,
    pub display_name: String,
    /// Where the source document is retrieved from.
    pub endpoint: String,
}

impl SourceRow {
    pub fn new(
        owning_organization: impl Into<String>,
        list_id: impl Into<String>,
        display_name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            owning_organization: owning_organization.into(),
            list_id: list_id.into(),
            display_name: display_name.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn key(&self) -> SourceKey {
        SourceKey::new(&self.owning_organization, &self.list_id)
    }

    /// File name used for the retrieved document of this row.
    pub fn document_file_name(&self) -> String {
        let key = self.key();
        format!("{}_{}.xml", key.organization(), key.list_id())
    }
}
