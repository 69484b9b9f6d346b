//! Primary structured-invoice parser adapter.
//!
//! The external parser prints its result as a language-native object dump on
//! its diagnostic stream. [`recover_structured_output`] isolates the repair
//! of that dump so it can be exercised against fixed strings.

use std::ffi::OsStr;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::rules::{DATETIME_CALL, NO_TEMPLATE, OBJECT_LITERAL};
use crate::error::ToolError;
use crate::models::FieldMap;
use crate::tool;

/// Why the primary parser produced no result.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The parser reported that none of its templates fit.
    #[error("primary parser has no template for this document")]
    NoTemplate,

    /// No usable object could be recovered from the diagnostics.
    #[error("primary parser output is malformed")]
    Malformed,

    /// The parser could not be run.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Trait for the first-choice extraction path.
pub trait PrimaryParser: Send + Sync {
    /// Parse `document` using the templates in `template_dir`.
    fn parse(&self, document: &Path, template_dir: &Path) -> Result<FieldMap, AdapterError>;
}

/// Drives an invoice2data-compatible command line tool.
#[derive(Debug, Clone)]
pub struct Invoice2DataParser {
    program: String,
}

impl Invoice2DataParser {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Invoice2DataParser {
    fn default() -> Self {
        Self::new("invoice2data")
    }
}

impl PrimaryParser for Invoice2DataParser {
    fn parse(&self, document: &Path, template_dir: &Path) -> Result<FieldMap, AdapterError> {
        let output = tool::run(
            &self.program,
            [
                OsStr::new("--template-folder"),
                template_dir.as_os_str(),
                OsStr::new("--output-format"),
                OsStr::new("json"),
                document.as_os_str(),
            ],
        )?;

        let diagnostics = String::from_utf8_lossy(&output.stderr);
        debug!(
            "{} exited with {} ({} bytes of diagnostics)",
            self.program,
            output.status,
            diagnostics.len()
        );

        if NO_TEMPLATE.is_match(&diagnostics) {
            return Err(AdapterError::NoTemplate);
        }

        match recover_structured_output(&diagnostics) {
            Some(fields) => Ok(fields),
            None if !output.status.success() => {
                tool::check_status(&self.program, document, &output)?;
                Err(AdapterError::Malformed)
            }
            None => Err(AdapterError::Malformed),
        }
    }
}

/// Recover the structured result embedded in the parser's diagnostics.
///
/// Takes the text from the first `{` to the last `}`, turns
/// `datetime.datetime(Y, M, D, ...)` calls into `"Y-M-D"` strings and single
/// quotes into double quotes, then parses JSON. Returns `None` when there is
/// no object literal, the repaired text is not JSON, or the object is empty.
pub fn recover_structured_output(diagnostics: &str) -> Option<FieldMap> {
    let literal = OBJECT_LITERAL.find(diagnostics)?.as_str();

    let repaired = DATETIME_CALL.replace_all(literal, r#""$1-$2-$3""#);
    let repaired = repaired.replace('\'', "\"");

    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        Ok(_) => {
            debug!("Recovered value is not a non-empty object");
            None
        }
        Err(e) => {
            debug!("Repaired diagnostics are not JSON: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DIAGNOSTICS: &str = "\
INFO:invoice2data.main:TEMPLATE: acme
DEBUG:invoice2data.extract:result
{'issuer': 'Acme', 'amount': 120.0, 'date': datetime.datetime(2024, 1, 5, 0, 0), \
'invoice_number': '042', 'currency': 'USD', 'desc': 'Invoice from Acme'}
";

    #[test]
    fn test_recover_repairs_dates_and_quotes() {
        let fields = recover_structured_output(DIAGNOSTICS).unwrap();
        assert_eq!(
            Value::Object(fields),
            json!({
                "issuer": "Acme",
                "amount": 120.0,
                "date": "2024-1-5",
                "invoice_number": "042",
                "currency": "USD",
                "desc": "Invoice from Acme",
            })
        );
    }

    #[test]
    fn test_recover_without_object() {
        assert!(recover_structured_output("ERROR: could not read file").is_none());
    }

    #[test]
    fn test_recover_unparseable_object() {
        assert!(recover_structured_output("{'amount': Decimal('1.00')}").is_none());
    }

    #[test]
    fn test_recover_empty_object() {
        assert!(recover_structured_output("result: {}").is_none());
    }

    #[test]
    fn test_recover_plain_json() {
        let fields = recover_structured_output(r#"{"amount": "5.00"}"#).unwrap();
        assert_eq!(fields["amount"], json!("5.00"));
    }

    #[test]
    fn test_missing_program() {
        let parser = Invoice2DataParser::new("docket-no-such-invoice2data");
        let err = parser
            .parse(Path::new("invoice.pdf"), Path::new("templates"))
            .unwrap_err();
        assert!(matches!(err, AdapterError::Tool(ToolError::Spawn { .. })));
    }
}
