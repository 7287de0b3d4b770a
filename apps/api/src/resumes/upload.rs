use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use tracing::{info, warn};

use crate::extraction::{DocumentFormat, ResumeExtractor};
use crate::models::record::ParsedRecord;
use crate::session::{BatchEntry, FileFailure, SessionBatch};

/// One file received from the browser, alive for the duration of the request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Parses every document in upload order. Each document is written to its own
/// temp file inside `scratch_dir`, parsed, and the temp file removed before the
/// next document starts, whether parsing succeeded or not. A failing document is
/// recorded in `failures` and never stops the rest of the batch.
pub async fn process_uploads(
    extractor: &dyn ResumeExtractor,
    scratch_dir: &Path,
    documents: Vec<UploadedDocument>,
) -> SessionBatch {
    let mut batch = SessionBatch::default();
    let total = documents.len();

    for document in documents {
        let file_name = base_name(&document.file_name);
        match parse_one(extractor, scratch_dir, &file_name, &document.bytes).await {
            Ok(record) => batch.entries.push(BatchEntry { file_name, record }),
            Err(message) => {
                warn!("Failed to parse {file_name}: {message}");
                batch.failures.push(FileFailure {
                    message: format!("Error parsing {file_name}: {message}"),
                    file_name,
                });
            }
        }
    }

    info!(
        "Processed upload batch: {} parsed, {} failed, {} total",
        batch.entries.len(),
        batch.failures.len(),
        total
    );
    batch
}

async fn parse_one(
    extractor: &dyn ResumeExtractor,
    scratch_dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<ParsedRecord, String> {
    let format = DocumentFormat::from_file_name(file_name).ok_or_else(|| {
        format!(
            "unsupported file type (allowed: {})",
            DocumentFormat::ALLOWED_EXTENSIONS.join(", ")
        )
    })?;

    // The temp file is deleted on drop, on every path out of this function.
    let mut temp = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile_in(scratch_dir)
        .map_err(|e| format!("could not create temporary file: {e}"))?;
    temp.write_all(bytes)
        .and_then(|_| temp.flush())
        .map_err(|e| format!("could not write temporary file: {e}"))?;

    let result = extractor
        .extract(temp.path())
        .await
        .map_err(|e| e.to_string());

    if let Err(e) = temp.close() {
        warn!("Could not remove temporary file for {file_name}: {e}");
    }
    result
}

/// Browsers may send a full client path; only the final component is kept.
fn base_name(raw: &str) -> String {
    raw.rsplit(&['/', '\\'][..])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unnamed")
        .to_string()
}
