use std::path::PathBuf;

use thiserror::Error;

/// Errors raised across the pipeline.
///
/// Recoverable variants exclude a single row or document and the run goes on;
/// see [`CodelistError::is_recoverable`].
#[derive(Debug, Error)]
pub enum CodelistError {
    /// A required registry column is absent.
    #[error("{path} is missing required column(s): {}", .missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    /// `(owning_organization, list_id)` repeats in the registry.
    #[error("duplicate source ({organization}, {list_id}) at registry row {row}")]
    DuplicateKey {
        organization: String,
        list_id: String,
        row: usize,
    },

    /// A source document cannot be read as a code list.
    #[error("malformed source document for {organization}:{list_id}: {reason}")]
    MalformedSource {
        organization: String,
        list_id: String,
        reason: String,
    },

    /// No source document was found for a registry row.
    #[error("no source document for {organization}:{list_id} at {path}")]
    MissingSource {
        organization: String,
        list_id: String,
        path: PathBuf,
    },

    /// Two namespaces claim the same prefix.
    #[error("prefix '{prefix}' is bound to both <{existing}> and <{conflicting}>")]
    PrefixConflict {
        prefix: String,
        existing: String,
        conflicting: String,
    },

    /// Every prefix conflict found while combining documents.
    #[error("{} prefix conflict(s) in the combined document", .conflicts.len())]
    PrefixConflicts { conflicts: Vec<CodelistError> },

    /// An output could not be written; partial content was discarded.
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// A stage input that an earlier stage should have produced is absent.
    #[error("missing input {path}: {reason}")]
    MissingInput { path: PathBuf, reason: String },

    #[error("failed to retrieve {url}: {message}")]
    Retrieval { url: String, message: String },
}

impl CodelistError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Csv {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn malformed(
        organization: impl Into<String>,
        list_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedSource {
            organization: organization.into(),
            list_id: list_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the run continues after this error.
    ///
    /// Recoverable errors skip one registry row or one document. Everything
    /// else aborts the remaining stages.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey { .. }
                | Self::MalformedSource { .. }
                | Self::MissingSource { .. }
                | Self::Retrieval { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CodelistError>;
