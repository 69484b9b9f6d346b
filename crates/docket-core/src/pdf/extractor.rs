//! In-process PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use std::path::Path;
use tracing::debug;

use super::{require_text, TextExtractor};
use crate::error::{ExtractionError, Result};

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| ExtractionError::Document(format!("failed to parse PDF: {}", e)))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(ExtractionError::Document("PDF is encrypted".to_string()).into());
            }
            debug!("Decrypted PDF with empty password");

            // pdf_extract reads the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data).map_err(|e| {
                ExtractionError::Document(format!("failed to save decrypted PDF: {}", e))
            })?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        if doc.get_pages().is_empty() {
            return Err(ExtractionError::Document("PDF has no pages".to_string()).into());
        }

        debug!("Loaded PDF with {} pages", doc.get_pages().len());
        self.document = Some(doc);
        Ok(())
    }

    /// Extract text from the entire PDF.
    pub fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(ExtractionError::Document("no document loaded".to_string()).into());
        }
        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| ExtractionError::Document(format!("failed to extract text: {}", e)))?;
        Ok(text)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// [`TextExtractor`] backed by [`PdfExtractor`], no external programs needed.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedTextExtractor;

impl EmbeddedTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for EmbeddedTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;
        require_text(path, extractor.extract_text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocketError, ExtractionError};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// A one-page PDF showing `lines` in Courier, or a blank page if empty.
    fn build_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = Vec::new();
        if !lines.is_empty() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), 720.into()]));
            for line in lines {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert!(extractor.extract_text().is_err());
    }

    #[test]
    fn test_embedded_extractor_accepts_short_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.pdf");
        std::fs::write(&path, build_pdf(&["Invoice #: 42 Total: 120.00"])).unwrap();

        let text = EmbeddedTextExtractor::new().extract_text(&path).unwrap();
        assert!(text.contains("120.00"), "{text:?}");
    }

    #[test]
    fn test_embedded_extractor_rejects_blank_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, build_pdf(&[])).unwrap();

        let err = EmbeddedTextExtractor::new().extract_text(&path).unwrap_err();
        assert!(matches!(
            err,
            DocketError::Extraction(ExtractionError::ImageOnly(ref name)) if name == "scan.pdf"
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"not a pdf").unwrap_err();
        assert_eq!(err.kind(), "document_error");
    }

    #[test]
    fn test_embedded_extractor_missing_file() {
        let err = EmbeddedTextExtractor::new()
            .extract_text(Path::new("/nonexistent/invoice.pdf"))
            .unwrap_err();
        assert!(matches!(err, DocketError::Io(_)));
    }
}
