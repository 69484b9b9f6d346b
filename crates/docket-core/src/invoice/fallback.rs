//! Template-driven regex extraction used when the primary parser gives up.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use super::rules::{apply_legacy_renames, is_blank, missing_required, normalize_date};
use crate::error::{ExtractionError, Result, TemplateError};
use crate::models::{fields as canonical, ExtractionConfig, FieldMap};
use crate::templates::ExtractionTemplate;

/// Applies a template's field patterns to raw document text.
#[derive(Debug, Clone)]
pub struct FallbackExtractor {
    /// Fields that must be present after extraction.
    required_fields: Vec<String>,
    /// Date formats tried after the template's own.
    date_formats: Vec<String>,
    /// Legacy field name to canonical name.
    legacy_renames: BTreeMap<String, String>,
    /// Currency used when the template has none.
    default_currency: String,
}

impl FallbackExtractor {
    /// Create an extractor with the default extraction settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            required_fields: config.required_fields.clone(),
            date_formats: config.date_formats.clone(),
            legacy_renames: config.legacy_renames.clone(),
            default_currency: config.default_currency.clone(),
        }
    }

    /// Set the required fields.
    pub fn with_required_fields<I, S>(mut self, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = required.into_iter().map(Into::into).collect();
        self
    }

    /// Run every field pattern against `text`.
    ///
    /// Stores the first capture group (or the whole match for patterns
    /// without groups), trimmed. Fields that do not match are left out.
    pub fn capture_fields(
        &self,
        text: &str,
        template: &ExtractionTemplate,
    ) -> std::result::Result<FieldMap, TemplateError> {
        let compiled = compile(template)?;
        let mut captured = FieldMap::new();

        for (field, patterns) in &compiled {
            let value = patterns.iter().find_map(|re| {
                let caps = re.captures(text)?;
                let group = if re.captures_len() > 1 { caps.get(1) } else { caps.get(0) };
                group.map(|m| m.as_str().trim().to_string())
            });

            match value {
                Some(value) => {
                    debug!("Field {} captured {:?}", field, value);
                    captured.insert(field.clone(), Value::String(value));
                }
                None => debug!("Field {} did not match", field),
            }
        }

        Ok(captured)
    }

    /// Normalize `date` and `due_date` in place.
    fn normalize_dates(&self, fields: &mut FieldMap, template: &ExtractionTemplate) {
        let formats: Vec<&str> = template
            .options
            .date_formats
            .iter()
            .chain(self.date_formats.iter())
            .map(String::as_str)
            .collect();

        for name in canonical::DATE_FIELDS {
            if let Some(Value::String(raw)) = fields.get_mut(name) {
                *raw = normalize_date(raw, formats.iter().copied());
            }
        }
    }

    /// Fill `issuer`, `desc` and `currency`.
    fn derive_fields(&self, fields: &mut FieldMap, name: &str, template: &ExtractionTemplate) {
        let issuer_missing = fields.get(canonical::ISSUER).is_none_or(is_blank);
        if issuer_missing {
            if let Some(issuer) = template.issuer.as_deref().filter(|i| !i.trim().is_empty()) {
                fields.insert(canonical::ISSUER.to_string(), Value::String(issuer.to_string()));
            }
        }

        let issuer = fields
            .get(canonical::ISSUER)
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string();
        fields.insert(
            canonical::DESC.to_string(),
            Value::String(format!("Invoice from {}", issuer)),
        );

        let currency = template
            .options
            .currency
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_currency.clone());
        fields.insert(canonical::CURRENCY.to_string(), Value::String(currency));
    }

    /// Full fallback extraction: capture, normalize dates, migrate legacy
    /// names, derive fields, validate.
    pub fn extract(&self, text: &str, name: &str, template: &ExtractionTemplate) -> Result<FieldMap> {
        let mut fields = self.capture_fields(text, template)?;

        self.normalize_dates(&mut fields, template);
        apply_legacy_renames(&mut fields, &self.legacy_renames);
        self.derive_fields(&mut fields, name, template);

        let missing = missing_required(&fields, &self.required_fields);
        if !missing.is_empty() {
            info!("Template {} is missing fields: {}", name, missing.join(", "));
            return Err(ExtractionError::MissingFields(missing).into());
        }

        debug!("Template {} extracted {} fields", name, fields.len());
        Ok(fields)
    }
}

impl Default for FallbackExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(
    template: &ExtractionTemplate,
) -> std::result::Result<Vec<(String, Vec<Regex>)>, TemplateError> {
    template
        .fields
        .iter()
        .map(|(field, rule)| {
            let patterns = rule
                .patterns()
                .into_iter()
                .map(|p| {
                    Regex::new(p).map_err(|source| TemplateError::InvalidPattern {
                        field: field.clone(),
                        source,
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok((field.clone(), patterns))
        })
        .collect()
}
