//! Text extraction for uploaded files.
//!
//! PDFs go through `pdf-extract`; every other accepted file is read as
//! UTF-8 text.

use std::path::Path;

use knowledge_hub_core::upload::{MIME_PDF, MIME_TEXT};

/// Extraction error. Callers decide whether it aborts the upload.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    NotUtf8,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::NotUtf8 => write!(f, "file is not valid UTF-8 text"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// MIME type for a local file, by extension.
///
/// `.pdf` maps to `application/pdf` and `.txt` to `text/plain`. Anything
/// else is `application/octet-stream`, which upload still accepts for
/// `.py`, `.md`, and `.rst` names.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => MIME_PDF,
        Some("txt") => MIME_TEXT,
        _ => "application/octet-stream",
    }
}

/// Extract plain text from file bytes.
pub fn extract_text(bytes: &[u8], mime: &str) -> Result<String, ExtractError> {
    if mime == MIME_PDF {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
    } else {
        String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::NotUtf8)
    }
}
