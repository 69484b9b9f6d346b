//! Field-extraction templates: the on-disk format, the store and the selector.

mod selector;
mod store;

pub use selector::{TemplateMatch, TemplateSelector};
pub use store::TemplateStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::invoice::rules::RAW_SUFFIX;

/// One field's extraction rule.
///
/// Usually a single pattern; a list of alternatives is tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRule {
    Pattern(String),
    Patterns(Vec<String>),
}

impl FieldRule {
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::Pattern(p) => vec![p.as_str()],
            Self::Patterns(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldRule {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

/// Formatting options declared by a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Currency code stamped on every result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Accepted date formats, tried before the built-in list.
    pub date_formats: Vec<String>,

    /// Options this crate does not interpret, kept for round-tripping.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A named, human-editable extraction template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionTemplate {
    /// Issuer the template is written for.
    pub issuer: Option<String>,

    /// Keywords expected in the document text.
    pub keywords: Vec<String>,

    /// Keywords that rule the template out.
    pub exclude_keywords: Vec<String>,

    /// Canonical field name to capture pattern.
    pub fields: BTreeMap<String, FieldRule>,

    pub options: TemplateOptions,

    /// Line-item patterns. Not used by extraction.
    pub lines: Vec<serde_yaml::Value>,

    /// Tie breaker for ranked selection, higher wins.
    #[serde(skip_serializing_if = "is_zero")]
    pub priority: i32,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl ExtractionTemplate {
    /// A fresh template for `issuer` with the authoring defaults.
    pub fn scaffold(issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        Self {
            keywords: vec![issuer.clone()],
            issuer: Some(issuer),
            options: TemplateOptions {
                currency: Some("USD".to_string()),
                date_formats: vec!["%m/%d/%Y".to_string()],
                extra: BTreeMap::new(),
            },
            ..Default::default()
        }
    }

    /// Builder-style field rule.
    pub fn with_field(mut self, name: impl Into<String>, rule: impl Into<FieldRule>) -> Self {
        self.fields.insert(name.into(), rule.into());
        self
    }
}

/// Lower-cased template name without the `_raw` suffix.
pub fn base_name(name: &str) -> String {
    RAW_SUFFIX.replace(name, "").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ACME_YAML: &str = r#"
issuer: Acme Corp
keywords:
  - Acme
exclude_keywords: []
fields:
  amount: 'Total Due:\s*([\d.,]+)'
  invoice_number:
    - 'Invoice #:\s*(\w+)'
    - 'Invoice No\.?\s*(\w+)'
options:
  currency: EUR
  date_formats:
    - '%d.%m.%Y'
  decimal_separator: ','
lines: []
"#;

    #[test]
    fn test_parse_template_document() {
        let template: ExtractionTemplate = serde_yaml::from_str(ACME_YAML).unwrap();

        assert_eq!(template.issuer.as_deref(), Some("Acme Corp"));
        assert_eq!(template.fields["amount"].patterns(), vec![r"Total Due:\s*([\d.,]+)"]);
        assert_eq!(template.fields["invoice_number"].patterns().len(), 2);
        assert_eq!(template.options.currency.as_deref(), Some("EUR"));
        assert!(template.options.extra.contains_key("decimal_separator"));
        assert_eq!(template.priority, 0);
    }

    #[test]
    fn test_null_issuer_and_missing_sections() {
        let template: ExtractionTemplate = serde_yaml::from_str("issuer: null\n").unwrap();
        assert_eq!(template, ExtractionTemplate::default());
    }

    #[test]
    fn test_scaffold_defaults() {
        let template = ExtractionTemplate::scaffold("Acme");
        assert_eq!(template.keywords, vec!["Acme".to_string()]);
        assert_eq!(template.options.currency.as_deref(), Some("USD"));
        assert_eq!(template.options.date_formats, vec!["%m/%d/%Y".to_string()]);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("Acme_raw"), "acme");
        assert_eq!(base_name("globex"), "globex");
    }
}
