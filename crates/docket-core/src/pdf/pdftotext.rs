//! Text extraction through the external `pdftotext` program.

use std::ffi::OsStr;
use std::path::Path;

use tracing::debug;

use super::{require_text, TextExtractor};
use crate::error::Result;
use crate::tool;

/// Runs `<program> -layout <document> -` and reads the text from stdout.
#[derive(Debug, Clone)]
pub struct PdftotextExtractor {
    program: String,
}

impl PdftotextExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let output = tool::run(
            &self.program,
            [OsStr::new("-layout"), path.as_os_str(), OsStr::new("-")],
        )?;
        tool::check_status(&self.program, path, &output)?;

        let text = String::from_utf8_lossy(&output.stdout)
            .replace('\u{0000}', "")
            .trim()
            .to_string();
        debug!("Extracted {} characters from {}", text.len(), path.display());

        require_text(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocketError;

    #[test]
    fn test_missing_program_reports_tool_error() {
        let extractor = PdftotextExtractor::new("docket-no-such-pdftotext");
        let err = extractor.extract_text(Path::new("invoice.pdf")).unwrap_err();
        assert!(matches!(err, DocketError::Tool(_)));
        assert_eq!(err.kind(), "tool_invocation_failure");
    }
}
