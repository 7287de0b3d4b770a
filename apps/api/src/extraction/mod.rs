//! Extraction adapter: turns an uploaded resume on disk into a `ParsedRecord`.
//!
//! Default: `HeuristicExtractor` (local text extraction + pattern matching).
//! Optional: `LlmExtractor` (same text, fields extracted by Claude).
//!
//! `AppState` holds an `Arc<dyn ResumeExtractor>`, chosen at startup via config.

pub mod documents;
pub mod heuristics;
pub mod llm;
pub mod prompts;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::record::{FieldValue, ParsedRecord};

pub use documents::{DocumentFormat, DocumentText};
pub use heuristics::HeuristicExtractor;
pub use llm::LlmExtractor;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt PDF: {0}")]
    Pdf(String),

    #[error("corrupt DOCX: {0}")]
    Docx(String),

    #[error("document contains no extractable text")]
    NoText,

    #[error("language model extraction failed: {0}")]
    Llm(#[from] LlmError),

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// The extraction trait. Implementations must not write anything outside
/// the given path; callers own the file's lifetime.
#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<ParsedRecord, ExtractionError>;

    /// Short backend name, reported by `/health`.
    fn backend(&self) -> &'static str;
}

/// Fields every extractor reports, in display order. Absent values are `null`.
pub const RESUME_FIELDS: [&str; 11] = [
    "name",
    "email",
    "mobile_number",
    "skills",
    "college_name",
    "degree",
    "designation",
    "experience",
    "company_names",
    "no_of_pages",
    "total_experience",
];

pub(crate) const PAGES_FIELD: &str = "no_of_pages";

/// Reads the document on the blocking pool. PDF and DOCX decoding are CPU-bound.
pub(crate) async fn read_document(path: &Path) -> Result<DocumentText, ExtractionError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || documents::read_document(&path))
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
}

/// Reorders `record` into `RESUME_FIELDS`, filling gaps with `null` and dropping
/// unknown keys. The page count comes from the document, never from `record`.
pub(crate) fn conform(record: &ParsedRecord, pages: Option<u32>) -> ParsedRecord {
    RESUME_FIELDS
        .iter()
        .map(|key| {
            let value = if *key == PAGES_FIELD {
                pages.map(FieldValue::number).unwrap_or(FieldValue::Missing)
            } else {
                record.get(key).cloned().unwrap_or(FieldValue::Missing)
            };
            (key.to_string(), value)
        })
        .collect()
}
