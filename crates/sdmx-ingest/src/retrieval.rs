//! Source document retrieval.
//!
//! Blocking HTTP GET with a bounded timeout and a small number of attempts.
//! Malformed URLs and permanent HTTP statuses are not retried.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};
use sdmx_model::{CodelistError, Result, SourceRow, write_atomic};

const USER_AGENT_VALUE: &str = concat!("sdmx-codelists/", env!("CARGO_PKG_VERSION"));
const SDMX_STRUCTURE_ACCEPT: &str = "application/vnd.sdmx.structure+xml, application/xml;q=0.9";

#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff` before retrying.
    pub backoff: Duration,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default)]
pub struct RetrievalOutcome {
    pub saved: Vec<PathBuf>,
    pub failures: Vec<CodelistError>,
}

/// Where the document of `row` lives inside `sources_dir`.
pub fn source_document_path(sources_dir: &Path, row: &SourceRow) -> PathBuf {
    sources_dir.join(row.document_file_name())
}

pub struct Retriever {
    client: Client,
    options: RetrievalOptions,
}

impl Retriever {
    pub fn new(options: RetrievalOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|err| CodelistError::Retrieval {
                url: String::new(),
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { client, options })
    }

    /// Fetch every registry row and store the documents in `sources_dir`.
    ///
    /// Failures are collected; a failing row never stops the others.
    pub fn retrieve_all(&self, rows: &[SourceRow], sources_dir: &Path) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome::default();
        for row in rows {
            let path = source_document_path(sources_dir, row);
            match self
                .fetch(&row.endpoint)
                .and_then(|bytes| save_document(&path, &bytes))
            {
                Ok(()) => outcome.saved.push(path),
                Err(err) => {
                    tracing::warn!(
                        organization = %row.owning_organization,
                        list_id = %row.list_id,
                        error = %err,
                        "source retrieval failed"
                    );
                    outcome.failures.push(err);
                }
            }
        }
        outcome
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let failure = |message: String| CodelistError::Retrieval {
            url: url.to_string(),
            message,
        };
        reqwest::Url::parse(url).map_err(|err| failure(format!("invalid URL: {err}")))?;

        let attempts = self.options.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            let start = Instant::now();
            match self.try_fetch(url) {
                Ok(bytes) => {
                    tracing::debug!(
                        url,
                        attempt,
                        bytes = bytes.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "downloaded source document"
                    );
                    return Ok(bytes);
                }
                Err(FetchError::Permanent(message)) => return Err(failure(message)),
                Err(FetchError::Transient(message)) => {
                    tracing::debug!(url, attempt, error = %message, "retryable retrieval failure");
                    last_error = message;
                }
            }
            if attempt < attempts {
                thread::sleep(self.options.backoff * attempt);
            }
        }
        Err(failure(format!("gave up after {attempts} attempt(s): {last_error}")))
    }

    fn try_fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
            .header(ACCEPT, HeaderValue::from_static(SDMX_STRUCTURE_ACCEPT))
            .send()
            .map_err(|err| {
                if err.is_builder() {
                    FetchError::Permanent(err.to_string())
                } else {
                    FetchError::Transient(err.to_string())
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            let message = format!("HTTP status {status}");
            return Err(if is_retryable_status(status) {
                FetchError::Transient(message)
            } else {
                FetchError::Permanent(message)
            });
        }
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|err| FetchError::Transient(err.to_string()))
    }
}

enum FetchError {
    Transient(String),
    Permanent(String),
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// Store a downloaded document, replacing any previous copy.
pub fn save_document(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic(path, bytes).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_statuses_are_not_retried() {
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn malformed_url_fails_without_network() {
        let retriever = Retriever::new(RetrievalOptions {
            backoff: Duration::ZERO,
            ..RetrievalOptions::default()
        })
        .unwrap();
        let err = retriever.fetch("not a url").unwrap_err();
        assert!(matches!(err, CodelistError::Retrieval { .. }));
        assert!(err.to_string().contains("invalid URL"));
    }

    #[test]
    fn saved_document_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("estat_cl_freq.xml");
        save_document(&path, b"<old/>").unwrap();
        save_document(&path, b"<new/>").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"<new/>");
    }
}
