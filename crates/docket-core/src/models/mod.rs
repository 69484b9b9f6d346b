//! Data models shared across the pipeline.

pub mod config;
pub mod record;

pub use config::{DocketConfig, ExtractionConfig, SelectionPolicy, StorageConfig, TextBackend, ToolsConfig};
pub use record::{
    fields, DocumentStatus, ExtractionResult, FieldMap, Location, OutcomeStatus, PersistedRecord,
    ProcessOutcome, Provenance,
};
