//! Raw text extraction from documents.

#[cfg(feature = "embedded-text")]
mod extractor;
mod pdftotext;

#[cfg(feature = "embedded-text")]
pub use extractor::{EmbeddedTextExtractor, PdfExtractor};
pub use pdftotext::PdftotextExtractor;

use std::path::Path;

use crate::error::{ExtractionError, Result};

/// Trait for raw text extraction backends.
pub trait TextExtractor: Send + Sync {
    /// Extract layout-preserving text from the document at `path`.
    ///
    /// Documents without any extractable text are rejected with
    /// [`ExtractionError::ImageOnly`].
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Reject text that is empty after trimming.
pub(crate) fn require_text(path: &Path, text: String) -> Result<String> {
    if text.trim().is_empty() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Err(ExtractionError::ImageOnly(name).into());
    }
    Ok(text)
}
