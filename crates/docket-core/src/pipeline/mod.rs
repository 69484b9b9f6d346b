//! Extraction orchestrator.
//!
//! A [`Pipeline`] owns the document workspace, the record store and the two
//! extraction paths. Every processing attempt follows the same shape:
//!
//! 1. The document is moved into the staging directory.
//! 2. The primary parser runs. A usable result ends the attempt.
//! 3. Otherwise the raw text is extracted, a fallback template is selected
//!    and applied.
//! 4. The record is upserted and the document is moved to `processed` or
//!    `unprocessed` as one transactional step.
//!
//! Extraction failures never escape [`Pipeline::process`]; they become a
//! failed [`ProcessOutcome`] and an `unprocessed` document.

mod locks;
mod state;
mod workspace;

pub use state::DocumentState;
pub use workspace::{sanitize_filename, Workspace};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::PoisonError;

use tracing::{debug, info, warn};

use crate::error::{DocketError, ExtractionError, Result, StoreError};
use crate::invoice::rules::missing_required;
use crate::invoice::{AdapterError, FallbackExtractor, Invoice2DataParser, PrimaryParser};
use crate::models::{
    DocketConfig, DocumentStatus, ExtractionResult, FieldMap, Location, OutcomeStatus,
    PersistedRecord, ProcessOutcome, TextBackend,
};
use crate::pdf::{PdftotextExtractor, TextExtractor};
use crate::store::ResultStore;
use crate::templates::{TemplateSelector, TemplateStore};
use locks::LockRegistry;

/// The document extraction pipeline.
pub struct Pipeline {
    config: DocketConfig,
    workspace: Workspace,
    store: ResultStore,
    templates: TemplateStore,
    selector: TemplateSelector,
    fallback: FallbackExtractor,
    primary: Box<dyn PrimaryParser>,
    text: Box<dyn TextExtractor>,
    locks: LockRegistry,
}

impl Pipeline {
    /// Build a pipeline with explicit adapters.
    ///
    /// Creates the workspace directories, opens the record store and moves
    /// documents left in staging by an interrupted run back to `incoming`.
    pub fn new(
        config: DocketConfig,
        primary: Box<dyn PrimaryParser>,
        text: Box<dyn TextExtractor>,
    ) -> Result<Self> {
        let workspace = Workspace::new(&config.storage);
        workspace.ensure()?;

        let store = ResultStore::open(&config.storage.database_path())?;
        let templates = TemplateStore::new(config.storage.raw_templates_dir());
        let selector = TemplateSelector::new(config.extraction.selection);
        let fallback = FallbackExtractor::from_config(&config.extraction);

        let pipeline = Self {
            config,
            workspace,
            store,
            templates,
            selector,
            fallback,
            primary,
            text,
            locks: LockRegistry::new(),
        };
        pipeline.recover_staged()?;
        Ok(pipeline)
    }

    /// Build a pipeline with the adapters named in the configuration.
    pub fn from_config(config: DocketConfig) -> Result<Self> {
        let primary = Box::new(Invoice2DataParser::new(config.tools.primary_program.clone()));
        let text = text_extractor(&config)?;
        Self::new(config, primary, text)
    }

    pub fn config(&self) -> &DocketConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Store holding the fallback templates.
    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Copy a file into `incoming`. Returns the document's filename.
    pub fn ingest(&self, source: &Path) -> Result<String> {
        let filename = self.workspace.ingest(source)?;
        info!("Ingested {}", filename);
        Ok(filename)
    }

    /// Process a document in `incoming`, or re-run one in `processed`.
    pub fn process(&self, filename: &str) -> Result<ProcessOutcome> {
        check_document_key(filename)?;
        let lock = self.locks.get(filename);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let from = self
            .workspace
            .locate(filename)
            .ok_or_else(|| DocketError::NotFound(filename.to_string()))?;
        DocumentState::from(from).check_transition(filename, DocumentState::Processing)?;

        self.attempt(filename, from)
    }

    /// Move an `unprocessed` document back to `incoming` and process it again.
    pub fn retry(&self, filename: &str) -> Result<ProcessOutcome> {
        check_document_key(filename)?;
        let lock = self.locks.get(filename);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.workspace.locate(filename) != Some(Location::Unprocessed) {
            return Err(DocketError::NotFound(format!("{} in unprocessed", filename)));
        }
        DocumentState::Unprocessed.check_transition(filename, DocumentState::Incoming)?;

        self.workspace
            .relocate(filename, Location::Unprocessed, Location::Incoming)?;
        info!("Retrying {}", filename);
        self.attempt(filename, Location::Incoming)
    }

    /// Process every document in `incoming`, one after the other.
    pub fn process_all(&self) -> Result<Vec<ProcessOutcome>> {
        self.process_all_with(|_| {})
    }

    /// Like [`Pipeline::process_all`], reporting each outcome as it happens.
    pub fn process_all_with<F>(&self, on_outcome: F) -> Result<Vec<ProcessOutcome>>
    where
        F: FnMut(&ProcessOutcome),
    {
        let filenames = self.workspace.list(Location::Incoming)?;
        info!("Processing {} documents", filenames.len());
        Ok(self.process_batch_with(&filenames, on_outcome))
    }

    /// Process the named documents in order. An error for one document
    /// becomes its failed outcome and the rest still run.
    pub fn process_batch_with<F>(
        &self,
        filenames: &[String],
        mut on_outcome: F,
    ) -> Vec<ProcessOutcome>
    where
        F: FnMut(&ProcessOutcome),
    {
        let mut outcomes = Vec::with_capacity(filenames.len());
        for filename in filenames {
            let outcome = self.process(filename).unwrap_or_else(|e| {
                let location = self.workspace.locate(filename).unwrap_or(Location::Incoming);
                failed(filename, location, &e)
            });
            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        self.locks.prune();
        outcomes
    }

    /// Every known document, from the file locations and the record store.
    pub fn documents(&self) -> Result<Vec<DocumentStatus>> {
        let mut documents: BTreeMap<String, DocumentStatus> = BTreeMap::new();

        for location in Location::ALL {
            for filename in self.workspace.list(location)? {
                documents.insert(
                    filename.clone(),
                    DocumentStatus {
                        filename,
                        location: Some(location),
                        record_status: None,
                        has_result: false,
                    },
                );
            }
        }

        for record in self.store.list()? {
            let entry = documents
                .entry(record.filename.clone())
                .or_insert_with(|| DocumentStatus {
                    filename: record.filename.clone(),
                    location: None,
                    record_status: None,
                    has_result: false,
                });
            entry.record_status = record.status;
            entry.has_result = record.json_data.is_some();
        }

        Ok(documents.into_values().collect())
    }

    pub fn record(&self, filename: &str) -> Result<Option<PersistedRecord>> {
        Ok(self.store.get(filename)?)
    }

    pub fn records(&self) -> Result<Vec<PersistedRecord>> {
        Ok(self.store.list()?)
    }

    /// Remove a document from every location with its cached text and record.
    pub fn delete(&self, filename: &str) -> Result<()> {
        check_document_key(filename)?;
        let lock = self.locks.get(filename);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let removed_file = self.workspace.remove(filename)?;
        let removed_record = self.store.delete(filename)?;
        if !removed_file && !removed_record {
            return Err(DocketError::NotFound(filename.to_string()));
        }

        info!("Deleted {}", filename);
        Ok(())
    }

    /// Remove every document, cached text and record.
    ///
    /// Returns the number of documents and records removed.
    pub fn reset(&self) -> Result<(usize, usize)> {
        let documents = self.workspace.clear()?;
        let records = self.store.clear()?;
        self.locks.prune();
        info!("Reset removed {} documents and {} records", documents, records);
        Ok((documents, records))
    }

    /// Move documents stranded in staging back to `incoming`.
    pub fn recover_staged(&self) -> Result<Vec<String>> {
        let recovered = self.workspace.recover_staged()?;
        for filename in &recovered {
            warn!(file = %filename, "recovered interrupted document");
        }
        Ok(recovered)
    }

    /// Raw text of a document wherever it lives. The text is cached.
    pub fn extract_text(&self, filename: &str) -> Result<String> {
        check_document_key(filename)?;
        let location = self
            .workspace
            .locate(filename)
            .ok_or_else(|| DocketError::NotFound(filename.to_string()))?;
        let text = self.text.extract_text(&self.workspace.path(location, filename))?;
        self.cache_text(filename, &text);
        Ok(text)
    }

    /// Apply one named fallback template to a document without recording
    /// anything.
    pub fn try_template(&self, template: &str, filename: &str) -> Result<FieldMap> {
        check_document_key(filename)?;
        let definition = self.templates.load(template)?;
        let text = self.extract_text(filename)?;
        self.fallback.extract(&text, template, &definition)
    }

    fn attempt(&self, filename: &str, from: Location) -> Result<ProcessOutcome> {
        let staged = self.workspace.stage(filename, from)?;
        debug!("Staged {} from {}", filename, from);

        let extraction = self.extract(filename, &staged);
        let (target, json_data) = match &extraction {
            Ok(result) => {
                let json = serde_json::to_string(result).map_err(|source| StoreError::Json {
                    filename: filename.to_string(),
                    source,
                });
                match json {
                    Ok(json) => (Location::Processed, Some(json)),
                    Err(e) => return Ok(self.abandon(filename, from, e.into())),
                }
            }
            Err(_) => (Location::Unprocessed, None),
        };

        let persisted = self.store.upsert_with(
            filename,
            json_data.as_deref(),
            target.as_str(),
            || self.workspace.unstage(filename, target),
            || self.workspace.stage(filename, target).map(|_| ()),
        );
        if let Err(e) = persisted {
            return Ok(self.abandon(filename, from, e.into()));
        }

        let outcome = match extraction {
            Ok(result) => {
                let message = match &result.template {
                    Some(template) => format!("Processed {} with template {}", filename, template),
                    None => format!("Processed {} with the primary parser", filename),
                };
                info!("{}", message);
                ProcessOutcome {
                    filename: filename.to_string(),
                    status: OutcomeStatus::Success,
                    location: target,
                    message,
                    error_kind: None,
                    provenance: Some(result.provenance),
                    template: result.template,
                }
            }
            Err(e) => {
                info!("Moved {} to unprocessed: {}", filename, e);
                failed(filename, target, &e)
            }
        };
        Ok(outcome)
    }

    /// Return a staged document to where it came from after persistence failed.
    fn abandon(&self, filename: &str, from: Location, error: DocketError) -> ProcessOutcome {
        warn!(file = %filename, error = %error, "failed to persist attempt");
        if let Err(e) = self.workspace.unstage(filename, from) {
            warn!(file = %filename, error = %e, "failed to restore staged document");
        }
        failed(filename, from, &error)
    }

    fn extract(&self, filename: &str, path: &Path) -> Result<ExtractionResult> {
        let template_dir = self.config.storage.templates_dir();
        match self.primary.parse(path, &template_dir) {
            Ok(fields) => {
                if !self.config.extraction.validate_primary {
                    return Ok(ExtractionResult::primary(fields));
                }
                let missing = missing_required(&fields, &self.config.extraction.required_fields);
                if missing.is_empty() {
                    return Ok(ExtractionResult::primary(fields));
                }
                info!(
                    "Primary result for {} is missing {}, trying templates",
                    filename,
                    missing.join(", ")
                );
            }
            Err(AdapterError::NoTemplate) => {
                debug!("Primary parser has no template for {}", filename);
            }
            Err(AdapterError::Malformed) => {
                let cause = ExtractionError::MalformedPrimaryOutput;
                info!(kind = cause.kind(), "Primary parser failed for {}: {}", filename, cause);
            }
            Err(e) => {
                info!("Primary parser failed for {}: {}", filename, e);
            }
        }

        self.extract_fallback(filename, path)
    }

    fn extract_fallback(&self, filename: &str, path: &Path) -> Result<ExtractionResult> {
        let text = self.text.extract_text(path)?;
        self.cache_text(filename, &text);

        let templates = self.templates.load_all()?;
        let selected = self
            .selector
            .select(&templates, filename, Some(&text))
            .ok_or_else(|| ExtractionError::NoTemplateMatch(filename.to_string()))?;

        let (name, template) = templates
            .iter()
            .find(|(name, _)| *name == selected.name)
            .ok_or_else(|| DocketError::NotFound(selected.name.clone()))?;

        let fields = self.fallback.extract(&text, name, template)?;
        Ok(ExtractionResult::fallback(fields, name.as_str()))
    }

    fn cache_text(&self, filename: &str, text: &str) {
        if let Err(e) = self.workspace.write_text(filename, text) {
            warn!(file = %filename, error = %e, "failed to cache raw text");
        }
    }
}

fn text_extractor(config: &DocketConfig) -> Result<Box<dyn TextExtractor>> {
    match config.tools.text_backend {
        TextBackend::External => Ok(Box::new(PdftotextExtractor::new(
            config.tools.text_program.clone(),
        ))),
        #[cfg(feature = "embedded-text")]
        TextBackend::Embedded => Ok(Box::new(crate::pdf::EmbeddedTextExtractor::new())),
        #[cfg(not(feature = "embedded-text"))]
        TextBackend::Embedded => Err(DocketError::Config(
            "embedded text backend requires the embedded-text feature".to_string(),
        )),
    }
}

/// Only names produced by ingest address a document. Anything else could
/// resolve outside the workspace directories.
fn check_document_key(filename: &str) -> Result<()> {
    match sanitize_filename(filename) {
        Some(key) if key == filename => Ok(()),
        _ => Err(DocketError::NotFound(filename.to_string())),
    }
}

fn failed(filename: &str, location: Location, error: &DocketError) -> ProcessOutcome {
    ProcessOutcome {
        filename: filename.to_string(),
        status: OutcomeStatus::Failed,
        location,
        message: error.to_string(),
        error_kind: Some(error.kind().to_string()),
        provenance: None,
        template: None,
    }
}
