use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Upload formats accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub const ALLOWED_EXTENSIONS: [&'static str; 2] = ["pdf", "docx"];

    /// Resolves the format from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

/// Plain text of a document plus its page count, when the format records one.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentText {
    pub text: String,
    pub pages: Option<u32>,
}

/// Extracts plain text from a PDF or DOCX file. Blocking.
pub fn read_document(path: &Path) -> Result<DocumentText, ExtractionError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let format = DocumentFormat::from_file_name(name)
        .ok_or_else(|| ExtractionError::UnsupportedFormat(name.to_string()))?;

    let document = match format {
        DocumentFormat::Pdf => {
            // pdf-extract panics on some malformed inputs instead of returning an error.
            let text = std::panic::catch_unwind(|| pdf_extract::extract_text(path))
                .map_err(|_| {
                    ExtractionError::Pdf("decoder aborted on malformed input".to_string())
                })?
                .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
            DocumentText {
                text,
                pages: pdf_page_count(path),
            }
        }
        DocumentFormat::Docx => {
            let file = std::fs::File::open(path).map_err(|e| ExtractionError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            let mut archive = zip::ZipArchive::new(file)
                .map_err(|e| ExtractionError::Docx(format!("failed to open archive: {e}")))?;
            DocumentText {
                text: extract_docx_text(&mut archive)?,
                pages: docx_page_count(&mut archive),
            }
        }
    };

    if document.text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }
    Ok(document)
}

fn pdf_page_count(path: &Path) -> Option<u32> {
    let doc = lopdf::Document::load(path).ok()?;
    u32::try_from(doc.get_pages().len()).ok()
}

/// Word stores the page count from its last layout in `docProps/app.xml`.
/// Documents written by other tools may not carry it.
fn docx_page_count<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Option<u32> {
    let mut xml = String::new();
    archive
        .by_name("docProps/app.xml")
        .ok()?
        .read_to_string(&mut xml)
        .ok()?;
    parse_app_pages(&xml)
}

fn parse_app_pages(xml: &str) -> Option<u32> {
    let mut reader = Reader::from_str(xml);
    let mut in_pages = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => in_pages = e.local_name().as_ref() == b"Pages",
            Ok(Event::Text(e)) if in_pages => {
                return e.decode().ok()?.trim().parse().ok();
            }
            Ok(Event::End(_)) => in_pages = false,
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn extract_docx_text<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, ExtractionError> {
    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(format!("missing word/document.xml: {e}")))?;

    let mut xml = String::new();
    document_xml
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(format!("unreadable word/document.xml: {e}")))?;

    parse_document_xml(&xml)
}

/// Collects `<w:t>` runs, one line per `<w:p>` paragraph. Tabs and breaks become whitespace.
fn parse_document_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let decoded = e.decode().unwrap_or_default();
                    text.push_str(&decoded);
                }
            }
            // Entity references such as `&amp;` arrive as their own events.
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    let name = e.decode().unwrap_or_default();
                    if let Some(c) = e.resolve_char_ref().ok().flatten() {
                        text.push(c);
                    } else if let Some(s) = quick_xml::escape::resolve_predefined_entity(&name) {
                        text.push_str(s);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!("XML parsing error: {e}")));
            }
            _ => {}
        }
    }

    Ok(text)
}
