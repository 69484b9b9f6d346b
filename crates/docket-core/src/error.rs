//! Error types for the docket-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the docket library.
#[derive(Error, Debug)]
pub enum DocketError {
    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// External tool invocation error.
    #[error("tool invocation failed: {0}")]
    Tool(#[from] ToolError),

    /// Template loading or compilation error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Record store error.
    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),

    /// A document or template does not exist where it was expected.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested lifecycle transition is not allowed.
    #[error("cannot move {filename} from {from} to {to}")]
    InvalidTransition {
        filename: String,
        from: String,
        to: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DocketError {
    /// Stable identifier used in status payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extraction(e) => e.kind(),
            Self::Tool(_) => "tool_invocation_failure",
            Self::Template(TemplateError::NotFound(_)) => "not_found",
            Self::Template(_) => "template_error",
            Self::Store(_) => "persistence_failure",
            Self::NotFound(_) => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Io(_) => "io_error",
            Self::Config(_) => "config_error",
        }
    }
}

/// Errors raised while turning a document into a field map.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No fallback template matched the document.
    #[error("no matching template for {0}")]
    NoTemplateMatch(String),

    /// Required canonical fields are absent or empty.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The primary parser's output could not be recovered as JSON.
    #[error("primary parser output is malformed")]
    MalformedPrimaryOutput,

    /// The document has no extractable text (scanned image).
    #[error("{0} appears to be an image-based file, run OCR before uploading")]
    ImageOnly(String),

    /// Failed to read the document.
    #[error("failed to read document: {0}")]
    Document(String),
}

impl ExtractionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoTemplateMatch(_) => "no_template_match",
            Self::MissingFields(_) => "missing_fields",
            Self::MalformedPrimaryOutput => "malformed_primary_output",
            Self::ImageOnly(_) => "image_only",
            Self::Document(_) => "document_error",
        }
    }
}

/// Errors from invoking an external program.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The program could not be started.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program exited with a non-zero status.
    #[error("{program} returned non-zero exit status for {}: {stderr}", .path.display())]
    NonZeroExit {
        program: String,
        path: PathBuf,
        stderr: String,
    },
}

/// Errors related to extraction templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template with this name exists.
    #[error("template not found: {0}")]
    NotFound(String),

    /// The template file is not valid YAML for a template.
    #[error("failed to parse template {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The template could not be serialized.
    #[error("failed to serialize template {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A field pattern is not a valid regular expression.
    #[error("invalid pattern for field {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// Template name contains path separators or is empty.
    #[error("invalid template name: {0:?}")]
    InvalidName(String),

    /// I/O error while reading or writing a template.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The stored or produced JSON could not be (de)serialized.
    #[error("invalid record JSON for {filename}: {source}")]
    Json {
        filename: String,
        #[source]
        source: serde_json::Error,
    },

    /// The file move inside the transactional step failed.
    #[error("failed to relocate {filename}: {source}")]
    Relocate {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for the docket library.
pub type Result<T> = std::result::Result<T, DocketError>;
