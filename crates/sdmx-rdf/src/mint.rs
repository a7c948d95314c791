//! Deterministic URI minting.
//!
//! URIs are pure functions of the namespace base and the normalized
//! identifiers, so identical inputs give identical URIs in every run.

use sdmx_model::normalize_component;

/// A minting namespace: the prefix declared in documents and its base URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub prefix: String,
    base: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, base: &str) -> Self {
        Self {
            prefix: prefix.into(),
            base: base.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Base URI without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// IRI bound to the prefix: the base with a trailing slash.
    pub fn iri(&self) -> String {
        format!("{}/", self.base)
    }

    /// `{base}/{owning_organization}/{list_id}`
    pub fn scheme_uri(&self, organization: &str, list_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base,
            normalize_component(organization),
            normalize_component(list_id)
        )
    }

    /// `{base}/code/{owning_organization}/{list_id}/{code_id}`
    pub fn concept_uri(&self, organization: &str, list_id: &str, code_id: &str) -> String {
        format!(
            "{}/code/{}/{}/{}",
            self.base,
            normalize_component(organization),
            normalize_component(list_id),
            normalize_component(code_id)
        )
    }
}

/// File stem shared by a scheme document and its quality report.
pub fn document_stem(organization: &str, list_id: &str) -> String {
    format!(
        "{}_{}",
        normalize_component(organization),
        normalize_component(list_id)
    )
}
