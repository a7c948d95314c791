use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::SourceKey;

/// Label text keyed by lowercase language tag. Untagged labels use `""`.
pub type Labels = BTreeMap<String, String>;

/// One code of a code list, with its parent reference flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub owning_organization: String,
    pub list_id: String,
    pub code_id: String,
    pub parent_code_id: Option<String>,
    pub labels: Labels,
}

impl CodeRecord {
    pub fn new(
        owning_organization: impl Into<String>,
        list_id: impl Into<String>,
        code_id: impl Into<String>,
    ) -> Self {
        Self {
            owning_organization: owning_organization.into(),
            list_id: list_id.into(),
            code_id: code_id.into(),
            parent_code_id: None,
            labels: Labels::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_code_id = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, lang: &str, text: impl Into<String>) -> Self {
        self.labels.insert(lang.to_lowercase(), text.into());
        self
    }

    /// Key of the code list this code belongs to.
    pub fn list_key(&self) -> SourceKey {
        SourceKey::new(&self.owning_organization, &self.list_id)
    }

    /// English label if present, then the untagged one, then any.
    pub fn preferred_label(&self) -> Option<&str> {
        preferred(&self.labels)
    }
}

/// Code counts used to spot lists that mostly reuse codes from elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStatistics {
    pub total: usize,
    /// Codes that appear in no other code list.
    pub unique: usize,
    /// Placeholder codes such as `_Z` or the numerals `1`..`10`.
    pub common: usize,
    pub shared: usize,
}

/// Code-list level metadata, one per flattened source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListRecord {
    pub owning_organization: String,
    pub list_id: String,
    pub display_name: String,
    pub code_count: usize,
    pub language_tags: BTreeSet<String>,
    pub version: Option<String>,
    pub urn: Option<String>,
    pub source_url: Option<String>,
    pub labels: Labels,
    pub descriptions: Labels,
    pub statistics: CodeStatistics,
    pub similar_lists: Vec<String>,
    pub source_sha256: Option<String>,
}

impl CodeListRecord {
    pub fn new(
        owning_organization: impl Into<String>,
        list_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            owning_organization: owning_organization.into(),
            list_id: list_id.into(),
            display_name: display_name.into(),
            code_count: 0,
            language_tags: BTreeSet::new(),
            version: None,
            urn: None,
            source_url: None,
            labels: Labels::new(),
            descriptions: Labels::new(),
            statistics: CodeStatistics::default(),
            similar_lists: Vec::new(),
            source_sha256: None,
        }
    }

    pub fn key(&self) -> SourceKey {
        SourceKey::new(&self.owning_organization, &self.list_id)
    }

    /// Recompute the derived `code_count` and `language_tags` from `codes`.
    ///
    /// Only codes of this list are counted; `codes` may hold other lists too.
    pub fn recompute(&mut self, codes: &[CodeRecord]) {
        let key = self.key();
        let mut count = 0;
        let mut tags = BTreeSet::new();
        for code in codes.iter().filter(|code| code.list_key() == key) {
            count += 1;
            tags.extend(code.labels.keys().filter(|tag| !tag.is_empty()).cloned());
        }
        tags.extend(self.labels.keys().filter(|tag| !tag.is_empty()).cloned());
        self.code_count = count;
        self.language_tags = tags;
    }

    /// Scheme title: the preferred list label, falling back to the display name.
    pub fn title(&self) -> &str {
        preferred(&self.labels).unwrap_or(&self.display_name)
    }
}

/// Code lists sharing one owning organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyGroup {
    pub owning_organization: String,
    pub member_list_ids: Vec<String>,
}

fn preferred(labels: &Labels) -> Option<&str> {
    labels
        .get("en")
        .or_else(|| labels.get(""))
        .or_else(|| labels.values().next())
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_counts_only_matching_list() {
        let codes = vec![
            CodeRecord::new("ESTAT", "CL_FREQ", "A").with_label("en", "Annual"),
            CodeRecord::new("ESTAT", "CL_FREQ", "M").with_label("FR", "Mensuel"),
            CodeRecord::new("ESTAT", "CL_SEX", "F").with_label("de", "Weiblich"),
        ];
        let mut list = CodeListRecord::new("ESTAT", "CL_FREQ", "Frequency");
        list.code_count = 99;
        list.recompute(&codes);
        assert_eq!(list.code_count, 2);
        let tags: Vec<&str> = list.language_tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["en", "fr"]);
    }

    #[test]
    fn preferred_label_falls_back() {
        let code = CodeRecord::new("IMF", "CL_AREA", "US").with_label("fr", "États-Unis");
        assert_eq!(code.preferred_label(), Some("États-Unis"));
        let code = code.with_label("", "United States");
        assert_eq!(code.preferred_label(), Some("United States"));
        let code = code.with_label("en", "United States of America");
        assert_eq!(code.preferred_label(), Some("United States of America"));
    }
}
