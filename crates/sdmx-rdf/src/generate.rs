//! Scheme and combined document generation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use sdmx_model::{AtomicFile, CodeListRecord, CodeRecord, CodelistError, Labels, Result};

use crate::document::{ConceptNode, SchemeNode, SemanticDocument};
use crate::mint::{Namespace, document_stem};
use crate::organizations::OrganizationRegistry;
use crate::turtle::write_turtle;
use crate::vocabulary::{Vocabulary, sdmx_2009};

pub const DEFAULT_BASE_URI: &str = "https://w3id.org/sdmx-codelists";
pub const DEFAULT_PREFIX: &str = "sip-sdmx";
pub const COMBINED_DOCUMENT: &str = "codelists.ttl";
pub const COMBINED_DOCUMENT_ID: &str = "codelists";

const SDMX_REGISTRY_PREFIX: &str = "sdmx-registry";
const SDMX_REGISTRY_NAMESPACE: &str = "https://registry.sdmx.org/sdmx/v2/structure/codelist/";

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base_uri: String,
    pub prefix: String,
    pub organizations: OrganizationRegistry,
    pub vocabularies: Vec<Vocabulary>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            organizations: OrganizationRegistry::with_builtin(),
            vocabularies: sdmx_2009(),
        }
    }
}

/// A scheme document written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub owning_organization: String,
    pub list_id: String,
    pub document_id: String,
    pub path: PathBuf,
    pub document: SemanticDocument,
}

#[derive(Debug, Default)]
pub struct GenerationOutcome {
    pub documents: Vec<GeneratedDocument>,
    /// Documents that could not be built or written.
    pub failures: Vec<CodelistError>,
}

pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Minting namespace for lists owned by `organization`.
    pub fn namespace_for(&self, organization: &str) -> Namespace {
        let overrides = self.config.organizations.get(organization);
        let prefix = overrides
            .and_then(|org| org.prefix.as_deref())
            .unwrap_or(&self.config.prefix);
        let base = overrides
            .and_then(|org| org.base_uri.as_deref())
            .unwrap_or(&self.config.base_uri);
        Namespace::new(prefix, base)
    }

    /// Build the document of one code list. `codes` may hold other lists.
    pub fn build_document(
        &self,
        list: &CodeListRecord,
        codes: &[CodeRecord],
    ) -> Result<SemanticDocument> {
        let org = list.owning_organization.as_str();
        let list_id = list.list_id.as_str();
        let namespace = self.namespace_for(org);
        let mut document = SemanticDocument::with_core_prefixes();
        document.declare_prefix(&namespace.prefix, &namespace.iri())?;

        let key = list.key();
        let list_codes: Vec<&CodeRecord> =
            codes.iter().filter(|code| code.list_key() == key).collect();
        let scheme_uri = namespace.scheme_uri(org, list_id);
        let uris: HashMap<&str, String> = list_codes
            .iter()
            .map(|code| {
                (
                    code.code_id.as_str(),
                    namespace.concept_uri(org, list_id, &code.code_id),
                )
            })
            .collect();

        let mut narrower: HashMap<&str, Vec<String>> = HashMap::new();
        for code in &list_codes {
            if let Some(parent) = code.parent_code_id.as_deref()
                && uris.contains_key(parent)
            {
                narrower
                    .entry(parent)
                    .or_default()
                    .push(uris[code.code_id.as_str()].clone());
            }
        }

        for code in &list_codes {
            let uri = uris[code.code_id.as_str()].clone();
            document.concepts.push(ConceptNode {
                scheme: scheme_uri.clone(),
                notation: code.code_id.clone(),
                labels: code.labels.clone(),
                broader: code
                    .parent_code_id
                    .as_deref()
                    .and_then(|parent| uris.get(parent))
                    .cloned(),
                narrower: narrower.remove(code.code_id.as_str()).unwrap_or_default(),
                uri,
            });
        }

        for vocabulary in self
            .config
            .vocabularies
            .iter()
            .filter(|vocabulary| vocabulary.applies_to(list_id))
        {
            let mut linked = false;
            for concept in &document.concepts {
                if let Some(external) = vocabulary.lookup(&concept.notation) {
                    document
                        .exact_matches
                        .insert((concept.uri.clone(), external));
                    linked = true;
                }
            }
            if linked {
                document.declare_prefix(&vocabulary.prefix, &vocabulary.namespace)?;
            }
        }

        let see_also = list
            .source_url
            .as_deref()
            .filter(|url| url.starts_with(SDMX_REGISTRY_NAMESPACE));
        if see_also.is_some() {
            document.declare_prefix(SDMX_REGISTRY_PREFIX, SDMX_REGISTRY_NAMESPACE)?;
        }

        document.schemes.push(SchemeNode {
            uri: scheme_uri,
            notation: list.list_id.clone(),
            labels: scheme_labels(list),
            title: Some(list.display_name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            descriptions: list.descriptions.clone(),
            publisher: self.config.organizations.label(org).map(str::to_string),
            version: list.version.clone(),
            see_also: see_also.map(str::to_string),
            top_concepts: document
                .concepts
                .iter()
                .filter(|concept| concept.is_top_concept())
                .map(|concept| concept.uri.clone())
                .collect(),
        });
        Ok(document)
    }

    /// Build and write one document per filtered code list.
    ///
    /// A failing document is logged and skipped; the others still get written.
    pub fn generate_schemes(
        &self,
        lists: &[CodeListRecord],
        codes: &[CodeRecord],
        output_dir: &Path,
    ) -> GenerationOutcome {
        let mut outcome = GenerationOutcome::default();
        for list in lists {
            let start = Instant::now();
            let document_id = document_stem(&list.owning_organization, &list.list_id);
            let path = output_dir.join(format!("{document_id}.ttl"));
            let result = self
                .build_document(list, codes)
                .and_then(|document| write_document(&document, &path).map(|_| document));
            match result {
                Ok(document) => {
                    tracing::info!(
                        organization = %list.owning_organization,
                        list_id = %list.list_id,
                        concepts = document.concepts.len(),
                        exact_matches = document.exact_matches.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "generated scheme document"
                    );
                    outcome.documents.push(GeneratedDocument {
                        owning_organization: list.owning_organization.clone(),
                        list_id: list.list_id.clone(),
                        document_id,
                        path,
                        document,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        organization = %list.owning_organization,
                        list_id = %list.list_id,
                        error = %err,
                        "scheme document not generated"
                    );
                    outcome.failures.push(err);
                }
            }
        }
        outcome
    }

    /// Write the union of all scheme documents.
    pub fn write_combined(
        &self,
        documents: &[GeneratedDocument],
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let combined = SemanticDocument::combine(documents.iter().map(|d| &d.document))?;
        let path = write_document(&combined, &output_dir.join(COMBINED_DOCUMENT))?;
        tracing::info!(
            path = %path.display(),
            schemes = combined.schemes.len(),
            concepts = combined.concepts.len(),
            "generated combined document"
        );
        Ok(path)
    }
}

/// Serialize `document` to `path` through a scoped file.
///
/// On any error the partially written file is removed.
pub fn write_document(document: &SemanticDocument, path: &Path) -> Result<PathBuf> {
    let mut file = AtomicFile::create(path)?;
    write_turtle(document, &mut file).map_err(|e| CodelistError::write(path, e))?;
    file.commit()
}

/// List labels, or the registry display name when the document had none.
fn scheme_labels(list: &CodeListRecord) -> Labels {
    let mut labels = list.labels.clone();
    if labels.is_empty() && !list.display_name.trim().is_empty() {
        labels.insert(String::new(), list.display_name.trim().to_string());
    }
    labels
}
