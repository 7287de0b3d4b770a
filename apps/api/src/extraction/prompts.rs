// Prompt templates for LLM-backed resume field extraction.
// `no_of_pages` is not requested; it is read from the document itself.

pub const RESUME_EXTRACT_SYSTEM: &str = "\
You are a precise resume data extractor. \
You MUST respond with a single flat JSON object only, no markdown fences, no explanations. \
Only report what the text states. Use null for anything not present.";

pub const RESUME_EXTRACT_PROMPT: &str = r#"Extract the following fields from the resume text below.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly these keys):
{
  "name": "string" | null,
  "email": "string" | null,
  "mobile_number": "string" | null,
  "skills": ["string"] | null,
  "college_name": ["string"] | null,
  "degree": ["string"] | null,
  "designation": ["string"] | null,
  "experience": ["string"] | null,
  "company_names": ["string"] | null,
  "total_experience": number | null
}

Values must be strings, numbers, null, or arrays of strings. Do not nest objects."#;
