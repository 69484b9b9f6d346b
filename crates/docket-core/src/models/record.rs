//! Extraction results, persisted records and status payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical field name to extracted value.
pub type FieldMap = serde_json::Map<String, Value>;

/// Canonical output keys.
pub mod fields {
    pub const INVOICE_NUMBER: &str = "invoice_number";
    pub const AMOUNT: &str = "amount";
    pub const DATE: &str = "date";
    pub const DUE_DATE: &str = "due_date";
    pub const CUSTOMER: &str = "customer";
    pub const VENDOR: &str = "vendor";
    pub const DESC: &str = "desc";
    pub const CURRENCY: &str = "currency";
    pub const ISSUER: &str = "issuer";

    /// Fields that receive date normalization.
    pub const DATE_FIELDS: [&str; 2] = [DATE, DUE_DATE];
}

/// Which extraction path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Primary,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A validated field map together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub provenance: Provenance,

    /// Fallback template name, absent for primary results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    pub fields: FieldMap,
}

impl ExtractionResult {
    pub fn primary(fields: FieldMap) -> Self {
        Self {
            provenance: Provenance::Primary,
            template: None,
            fields,
        }
    }

    pub fn fallback(fields: FieldMap, template: impl Into<String>) -> Self {
        Self {
            provenance: Provenance::Fallback,
            template: Some(template.into()),
            fields,
        }
    }

    /// Value of a field as a string, if it is one.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Where a document currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Incoming,
    Processed,
    Unprocessed,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Incoming, Location::Processed, Location::Unprocessed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Processed => "processed",
            Self::Unprocessed => "unprocessed",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub filename: String,

    /// Serialized [`ExtractionResult`], `None` for failed attempts.
    pub json_data: Option<String>,

    pub status: Option<String>,

    /// RFC 3339 timestamp of the last write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PersistedRecord {
    /// Decode `json_data` into a result.
    pub fn result(&self) -> Option<Result<ExtractionResult, serde_json::Error>> {
        self.json_data.as_deref().map(serde_json::from_str)
    }
}

/// Outcome of one processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Structured status payload returned for every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub filename: String,
    pub status: OutcomeStatus,
    /// Location the document ended up in.
    pub location: Location,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// A document as seen by the status listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub filename: String,
    /// `None` when only a record remains.
    pub location: Option<Location>,
    pub record_status: Option<String>,
    pub has_result: bool,
}
