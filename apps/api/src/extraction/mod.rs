//! Uploaded file → plain text.
//!
//! Extraction never fails loudly: unsupported formats, corrupt files and parser
//! panics all produce `None`, which the scorer turns into an `Error` verdict.

mod docx;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::scoring::orchestrator::Document;

pub use docx::extract_docx_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    PlainText,
}

impl FileType {
    /// Detects the type from the filename extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(FileType::Pdf),
            "docx" => Some(FileType::Docx),
            "txt" | "md" => Some(FileType::PlainText),
            _ => None,
        }
    }
}

pub trait TextSource: Send + Sync {
    /// Returns the document text, or `None` when it cannot be read.
    fn extract_text(&self, bytes: &[u8], filename: &str) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl TextSource for DocumentExtractor {
    fn extract_text(&self, bytes: &[u8], filename: &str) -> Option<String> {
        let Some(file_type) = FileType::from_filename(filename) else {
            warn!(filename, "Unsupported file type");
            return None;
        };

        let extracted = match file_type {
            FileType::Pdf => extract_pdf_text(bytes),
            FileType::Docx => extract_docx_text(bytes).map_err(|e| e.to_string()),
            FileType::PlainText => String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string()),
        };

        match extracted {
            Ok(text) if !text.trim().is_empty() => {
                debug!(filename, ?file_type, chars = text.len(), "Extracted text");
                Some(text)
            }
            Ok(_) => {
                warn!(filename, ?file_type, "Document contains no text");
                None
            }
            Err(reason) => {
                warn!(filename, ?file_type, %reason, "Text extraction failed");
                None
            }
        }
    }
}

/// `pdf-extract` can panic on malformed input; the panic is contained here.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("PDF parser panicked".to_string()),
    }
}

/// Runs extraction on the blocking pool and wraps the outcome as a [`Document`].
pub async fn extract_document(
    source: Arc<dyn TextSource>,
    filename: String,
    bytes: Bytes,
) -> Document {
    let name = filename.clone();
    let text = tokio::task::spawn_blocking(move || source.extract_text(&bytes, &name))
        .await
        .unwrap_or_else(|e| {
            warn!(filename = %filename, error = %e, "Extraction task aborted");
            None
        });

    Document {
        filename,
        raw_text: text,
    }
}
