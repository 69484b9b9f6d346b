//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration for the docket pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocketConfig {
    /// Storage layout configuration.
    pub storage: StorageConfig,

    /// External tool configuration.
    pub tools: ToolsConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Where documents, templates and records live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding the document locations and the database.
    pub data_dir: PathBuf,

    /// Templates consumed by the primary parser (default: `<data_dir>/templates`).
    pub templates_dir: Option<PathBuf>,

    /// Fallback templates (default: `<data_dir>/templates_raw`).
    pub raw_templates_dir: Option<PathBuf>,

    /// SQLite database file (default: `<data_dir>/invoices.db`).
    pub database: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            templates_dir: None,
            raw_templates_dir: None,
            database: None,
        }
    }
}

impl StorageConfig {
    pub fn incoming_dir(&self) -> PathBuf {
        self.data_dir.join("incoming")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn unprocessed_dir(&self) -> PathBuf {
        self.data_dir.join("unprocessed")
    }

    /// Holds documents while an attempt is in flight.
    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir.join(".staging")
    }

    /// Cache of raw text produced by the fallback path.
    pub fn text_dir(&self) -> PathBuf {
        self.data_dir.join("text")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("templates"))
    }

    pub fn raw_templates_dir(&self) -> PathBuf {
        self.raw_templates_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("templates_raw"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| self.data_dir.join("invoices.db"))
    }
}

/// How raw text is pulled out of a document on the fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBackend {
    /// Invoke the external text extraction program.
    External,
    /// Extract in-process with lopdf and pdf-extract.
    Embedded,
}

/// External programs invoked by the adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Structured invoice parser used on the primary path.
    pub primary_program: String,

    /// Layout-preserving text extractor used on the fallback path.
    pub text_program: String,

    /// Text extraction backend.
    pub text_backend: TextBackend,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            primary_program: "invoice2data".to_string(),
            text_program: "pdftotext".to_string(),
            text_backend: TextBackend::External,
        }
    }
}

/// Template selection policy for the fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First candidate in name order wins.
    FirstMatch,
    /// Issuer match, then keyword overlap, then declared priority.
    Ranked,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Canonical fields that must be present and non-empty.
    pub required_fields: Vec<String>,

    /// Currency used when a template does not declare one.
    pub default_currency: String,

    /// Date formats tried after the template's own formats.
    pub date_formats: Vec<String>,

    /// Legacy field name to canonical field name.
    pub legacy_renames: BTreeMap<String, String>,

    /// Template selection policy.
    pub selection: SelectionPolicy,

    /// Enforce `required_fields` on primary parser results too.
    pub validate_primary: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            required_fields: ["invoice_number", "amount", "date", "customer", "vendor"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_currency: "USD".to_string(),
            date_formats: [
                "%d %B %Y",
                "%d %b %Y",
                "%B %d, %Y",
                "%b %d, %Y",
                "%m/%d/%Y",
                "%m/%d/%y",
                "%Y-%m-%d",
                "%d.%m.%Y",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            legacy_renames: BTreeMap::from([
                ("sold_to".to_string(), "customer".to_string()),
                ("bill_to".to_string(), "vendor".to_string()),
            ]),
            selection: SelectionPolicy::Ranked,
            validate_primary: false,
        }
    }
}

impl DocketConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Point every storage location at a new root directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = data_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_follow_data_dir() {
        let config = DocketConfig::default().with_data_dir("/tmp/docket");
        assert_eq!(config.storage.incoming_dir(), PathBuf::from("/tmp/docket/incoming"));
        assert_eq!(
            config.storage.raw_templates_dir(),
            PathBuf::from("/tmp/docket/templates_raw")
        );
        assert_eq!(
            config.storage.database_path(),
            PathBuf::from("/tmp/docket/invoices.db")
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DocketConfig =
            serde_json::from_str(r#"{"extraction": {"selection": "first_match"}}"#).unwrap();
        assert_eq!(config.extraction.selection, SelectionPolicy::FirstMatch);
        assert_eq!(config.extraction.default_currency, "USD");
        assert_eq!(config.extraction.required_fields.len(), 5);
        assert_eq!(config.tools.primary_program, "invoice2data");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocketConfig::default();
        config.extraction.validate_primary = true;
        config.save(&path).unwrap();

        let loaded = DocketConfig::from_file(&path).unwrap();
        assert!(loaded.extraction.validate_primary);
    }
}
