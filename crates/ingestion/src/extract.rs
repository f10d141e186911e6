//! Document text extraction by format

use crate::errors::IngestionError;
use crate::pdf::{clean_text, extract_text_from_pdf};
use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Turns raw document bytes into plain text
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestionError>;

    /// Short format name for logs
    fn format(&self) -> &'static str;
}

/// PDF documents, page by page
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestionError> {
        extract_text_from_pdf(bytes)
    }

    fn format(&self) -> &'static str {
        "pdf"
    }
}

/// UTF-8 text; invalid sequences are replaced
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestionError> {
        Ok(clean_text(&String::from_utf8_lossy(bytes)))
    }

    fn format(&self) -> &'static str {
        "text"
    }
}

/// Select an extractor from a MIME type such as `application/pdf` or
/// `text/plain; charset=utf-8`
pub fn extractor_for(content_type: &str) -> Result<Box<dyn TextExtractor>, IngestionError> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/pdf" => Ok(Box::new(PdfExtractor)),
        m if m.starts_with("text/") => Ok(Box::new(PlainTextExtractor)),
        _ => Err(IngestionError::UnsupportedFormat(content_type.to_string())),
    }
}

/// Select an extractor from a file extension
pub fn extractor_for_path(path: &Path) -> Result<Box<dyn TextExtractor>, IngestionError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfExtractor)),
        "txt" | "text" | "md" | "markdown" => Ok(Box::new(PlainTextExtractor)),
        _ => Err(IngestionError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Guess the extractor from the leading bytes when no type is declared
pub fn sniff_extractor(bytes: &[u8]) -> Box<dyn TextExtractor> {
    if bytes.starts_with(PDF_MAGIC) {
        Box::new(PdfExtractor)
    } else {
        Box::new(PlainTextExtractor)
    }
}

/// Read and extract a document from disk
pub fn extract_file(path: &Path) -> Result<String, IngestionError> {
    let extractor = extractor_for_path(path)?;
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), format = extractor.format(), bytes = bytes.len(), "Extracting document");
    extractor.extract(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_for_content_type() {
        assert_eq!(extractor_for("application/pdf").unwrap().format(), "pdf");
        assert_eq!(extractor_for("Text/Plain; charset=utf-8").unwrap().format(), "text");
        assert_eq!(extractor_for("text/markdown").unwrap().format(), "text");
        assert!(matches!(
            extractor_for("image/png"),
            Err(IngestionError::UnsupportedFormat(t)) if t == "image/png"
        ));
    }

    #[test]
    fn test_extractor_for_path() {
        assert_eq!(extractor_for_path(Path::new("paper.PDF")).unwrap().format(), "pdf");
        assert_eq!(extractor_for_path(Path::new("notes.md")).unwrap().format(), "text");
        assert!(extractor_for_path(Path::new("slides.pptx")).is_err());
        assert!(extractor_for_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_sniff() {
        assert_eq!(sniff_extractor(b"%PDF-1.5\n...").format(), "pdf");
        assert_eq!(sniff_extractor(b"plain words").format(), "text");
    }

    #[test]
    fn test_plain_text_lossy() {
        let text = PlainTextExtractor
            .extract(b"caf\xC3\xA9  au\n lait \xFF")
            .unwrap();
        assert_eq!(text, "caf\u{e9} au lait \u{FFFD}");
    }

    #[test]
    fn test_extract_file_missing() {
        let err = extract_file(Path::new("/nonexistent/docqa-missing.txt")).unwrap_err();
        assert!(matches!(err, IngestionError::Io(_)));
    }
}
