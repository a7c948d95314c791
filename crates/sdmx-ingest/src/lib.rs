//! Code-list ingestion: the source registry, SDMX-ML flattening, and the
//! retrieval collaborator that fills the sources directory.

pub mod flatten;
pub mod registry;
pub mod retrieval;

pub use flatten::{FlattenedList, flatten_bytes, flatten_document, flatten_file, rest_url_from_urn};
pub use registry::{REQUIRED_COLUMNS, RegistryLoad, load_registry, read_registry};
pub use retrieval::{
    RetrievalOptions, RetrievalOutcome, Retriever, save_document, source_document_path,
};
