//! Identifier minting and SKOS graph generation.
//!
//! Every filtered code list becomes one `skos:ConceptScheme` document. Scheme
//! and concept URIs are minted by [`Namespace`] from normalized identifiers
//! only, so regenerating from the same filtered tables is byte-identical.
//! After all scheme documents are written, [`Generator::write_combined`]
//! merges them into one document.

pub mod document;
pub mod generate;
pub mod mint;
pub mod organizations;
pub mod turtle;
pub mod vocabulary;

pub use document::{CORE_PREFIXES, ConceptNode, SchemeNode, SemanticDocument};
pub use generate::{
    COMBINED_DOCUMENT, COMBINED_DOCUMENT_ID, DEFAULT_BASE_URI, DEFAULT_PREFIX, GeneratedDocument,
    GenerationOutcome, Generator, GeneratorConfig, write_document,
};
pub use mint::{Namespace, document_stem};
pub use organizations::{Organization, OrganizationRegistry};
pub use turtle::{escape_literal, is_language_tag, render_turtle, write_turtle};
pub use vocabulary::{SDMX_CODE_NAMESPACE, SDMX_CODE_PREFIX, Vocabulary, sdmx_2009};
