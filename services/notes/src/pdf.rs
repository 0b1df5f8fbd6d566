//! PDF text extraction using lopdf

use async_trait::async_trait;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{NotesError, NotesResult};

/// Text of a PDF and its page count
#[derive(Debug, Clone, PartialEq)]
pub struct PdfText {
    /// Page texts joined by blank lines
    pub text: String,
    pub page_count: i32,
}

impl PdfText {
    /// Whether extraction produced usable text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Reads the text out of a stored PDF
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    /// `None` when the file cannot be read as a PDF
    async fn extract(&self, path: &Path) -> Option<PdfText>;
}

#[derive(Debug, Clone, Default)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Load a PDF and extract every page. Pages that fail are skipped.
pub fn extract_pdf_text(path: &Path) -> NotesResult<PdfText> {
    let doc = Document::load(path)
        .map_err(|e| NotesError::PdfExtraction(format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    let page_count = pages.len() as i32;
    debug!("Extracting text from {} pages of {}", page_count, path.display());

    let mut parts = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            Err(e) => warn!("Failed to extract text from page {}: {}", page_num, e),
        }
    }

    Ok(PdfText {
        text: parts.join("\n\n"),
        page_count,
    })
}

#[async_trait]
impl PdfExtractor for LopdfExtractor {
    async fn extract(&self, path: &Path) -> Option<PdfText> {
        let path: PathBuf = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || extract_pdf_text(&path)).await;

        match result {
            Ok(Ok(text)) => {
                debug!(
                    "Extracted {} characters from {} pages",
                    text.text.chars().count(),
                    text.page_count
                );
                Some(text)
            }
            Ok(Err(e)) => {
                warn!("{}", e);
                None
            }
            Err(e) => {
                warn!("PDF extraction task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreadable_file_yields_none() {
        let dir = std::env::temp_dir().join("notes-pdf-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not-a.pdf");
        std::fs::write(&path, b"plain text, not a pdf").unwrap();

        assert!(LopdfExtractor::new().extract(&path).await.is_none());
        assert!(
            LopdfExtractor::new()
                .extract(&dir.join("missing.pdf"))
                .await
                .is_none()
        );
    }

    #[test]
    fn test_has_text() {
        let empty = PdfText {
            text: " \n ".to_string(),
            page_count: 2,
        };
        assert!(!empty.has_text());
    }
}
