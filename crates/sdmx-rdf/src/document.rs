//! In-memory SKOS document built for one code list, or for all of them.

use std::collections::{BTreeMap, BTreeSet};

use sdmx_model::{CodelistError, Labels, Result};

pub const SKOS: (&str, &str) = ("skos", "http://www.w3.org/2004/02/skos/core#");
pub const DCT: (&str, &str) = ("dct", "http://purl.org/dc/terms/");
pub const OWL: (&str, &str) = ("owl", "http://www.w3.org/2002/07/owl#");
pub const RDFS: (&str, &str) = ("rdfs", "http://www.w3.org/2000/01/rdf-schema#");

/// Prefixes declared by every generated document.
pub const CORE_PREFIXES: [(&str, &str); 4] = [DCT, OWL, RDFS, SKOS];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeNode {
    pub uri: String,
    pub notation: String,
    pub labels: Labels,
    /// Registry display name.
    pub title: Option<String>,
    pub descriptions: Labels,
    pub publisher: Option<String>,
    pub version: Option<String>,
    pub see_also: Option<String>,
    pub top_concepts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptNode {
    pub uri: String,
    pub scheme: String,
    pub notation: String,
    pub labels: Labels,
    pub broader: Option<String>,
    pub narrower: Vec<String>,
}

impl ConceptNode {
    pub fn is_top_concept(&self) -> bool {
        self.broader.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemanticDocument {
    /// Prefix to namespace IRI.
    pub prefixes: BTreeMap<String, String>,
    pub schemes: Vec<SchemeNode>,
    /// In filtered-table order.
    pub concepts: Vec<ConceptNode>,
    /// `(local concept URI, external URI)`.
    pub exact_matches: BTreeSet<(String, String)>,
}

impl SemanticDocument {
    pub fn with_core_prefixes() -> Self {
        let mut document = Self::default();
        for (prefix, namespace) in CORE_PREFIXES {
            document
                .prefixes
                .insert(prefix.to_string(), namespace.to_string());
        }
        document
    }

    /// Declare `prefix`, failing if it is already bound to another namespace.
    pub fn declare_prefix(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        match self.prefixes.get(prefix) {
            Some(existing) if existing != namespace => Err(CodelistError::PrefixConflict {
                prefix: prefix.to_string(),
                existing: existing.clone(),
                conflicting: namespace.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.prefixes
                    .insert(prefix.to_string(), namespace.to_string());
                Ok(())
            }
        }
    }

    pub fn exact_matches_of<'a>(&'a self, concept: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.exact_matches
            .iter()
            .filter(move |(local, _)| local == concept)
            .map(|(_, external)| external.as_str())
    }

    /// Union of several documents.
    ///
    /// Fails with [`CodelistError::PrefixConflicts`] holding one
    /// [`CodelistError::PrefixConflict`] per clashing binding.
    pub fn combine<'a, I>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a SemanticDocument>,
    {
        let mut combined = Self::default();
        let mut conflicts = Vec::new();
        for document in documents {
            for (prefix, namespace) in &document.prefixes {
                if let Err(conflict) = combined.declare_prefix(prefix, namespace) {
                    tracing::error!(error = %conflict, "prefix conflict in combined document");
                    conflicts.push(conflict);
                }
            }
            combined.schemes.extend(document.schemes.iter().cloned());
            combined.concepts.extend(document.concepts.iter().cloned());
            combined
                .exact_matches
                .extend(document.exact_matches.iter().cloned());
        }
        if conflicts.is_empty() {
            Ok(combined)
        } else {
            Err(CodelistError::PrefixConflicts { conflicts })
        }
    }
}
