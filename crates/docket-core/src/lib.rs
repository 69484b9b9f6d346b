//! Core library for invoice document extraction.
//!
//! This crate provides:
//! - Raw text extraction from PDFs (external `pdftotext` or in-process)
//! - An adapter for the external structured invoice parser
//! - YAML field-extraction templates with ranked selection
//! - Regex fallback extraction with date normalization and validation
//! - A SQLite record store and the per-document processing pipeline

pub mod error;
pub mod invoice;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod store;
pub mod templates;
pub mod tool;

pub use error::{DocketError, Result};
pub use invoice::{FallbackExtractor, Invoice2DataParser, PrimaryParser};
pub use models::{
    DocketConfig, DocumentStatus, ExtractionResult, FieldMap, Location, OutcomeStatus,
    PersistedRecord, ProcessOutcome, Provenance,
};
pub use pdf::{PdftotextExtractor, TextExtractor};
#[cfg(feature = "embedded-text")]
pub use pdf::EmbeddedTextExtractor;
pub use pipeline::Pipeline;
pub use store::ResultStore;
pub use templates::{ExtractionTemplate, TemplateSelector, TemplateStore};
