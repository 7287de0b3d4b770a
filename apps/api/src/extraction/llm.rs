use std::path::Path;

use async_trait::async_trait;

use super::prompts::{RESUME_EXTRACT_PROMPT, RESUME_EXTRACT_SYSTEM};
use super::{conform, read_document, ExtractionError, ResumeExtractor};
use crate::llm_client::LlmClient;
use crate::models::record::ParsedRecord;

/// Upper bound on resume text sent to the model, in characters.
const MAX_PROMPT_CHARS: usize = 24_000;

/// Extracts fields by sending the document text to Claude.
pub struct LlmExtractor(pub LlmClient);

#[async_trait]
impl ResumeExtractor for LlmExtractor {
    async fn extract(&self, path: &Path) -> Result<ParsedRecord, ExtractionError> {
        let document = read_document(path).await?;
        let prompt = build_prompt(&document.text);
        let reply = self
            .0
            .complete_json::<ParsedRecord>(&prompt, RESUME_EXTRACT_SYSTEM)
            .await?;
        Ok(conform(&reply, document.pages))
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

fn build_prompt(text: &str) -> String {
    let clipped: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    RESUME_EXTRACT_PROMPT.replace("{resume_text}", clipped.trim())
}
