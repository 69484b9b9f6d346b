//! Choosing a fallback template for a document.

use std::cmp::Reverse;
use std::path::Path;

use tracing::{debug, trace};

use super::{base_name, ExtractionTemplate};
use crate::models::SelectionPolicy;

/// A template that qualified for a document, with its ranking signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    pub name: String,
    /// The issuer occurs in the filename or the raw text.
    pub issuer_match: bool,
    /// Number of template keywords found in the raw text.
    pub keyword_overlap: usize,
    pub priority: i32,
}

/// Picks the best fallback template for a filename and optional raw text.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSelector {
    policy: SelectionPolicy,
}

impl TemplateSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Name of the winning template, if any qualifies.
    pub fn select(
        &self,
        templates: &[(String, ExtractionTemplate)],
        filename: &str,
        text: Option<&str>,
    ) -> Option<TemplateMatch> {
        let input = MatchInput::new(filename, text);

        let selected = match self.policy {
            SelectionPolicy::FirstMatch => templates
                .iter()
                .find_map(|(name, template)| input.evaluate(name, template)),
            SelectionPolicy::Ranked => {
                let mut candidates: Vec<TemplateMatch> = templates
                    .iter()
                    .filter(|(name, template)| !input.is_excluded(name, template))
                    .filter_map(|(name, template)| input.evaluate(name, template))
                    .collect();
                candidates.sort_by_key(|m| {
                    (
                        Reverse(m.issuer_match),
                        Reverse(m.keyword_overlap),
                        Reverse(m.priority),
                        m.name.clone(),
                    )
                });
                candidates.into_iter().next()
            }
        };

        match &selected {
            Some(m) => debug!("Selected template {} for {} ({:?})", m.name, filename, self.policy),
            None => debug!("No template matched {}", filename),
        }
        selected
    }
}

/// Lower-cased views of the document being matched.
struct MatchInput {
    filename: String,
    stem: String,
    text: Option<String>,
}

impl MatchInput {
    fn new(filename: &str, text: Option<&str>) -> Self {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        Self {
            filename: filename.to_lowercase(),
            stem: stem.to_lowercase(),
            text: text.map(str::to_lowercase),
        }
    }

    fn text_contains(&self, needle: &str) -> bool {
        self.text.as_deref().is_some_and(|t| t.contains(needle))
    }

    fn evaluate(&self, name: &str, template: &ExtractionTemplate) -> Option<TemplateMatch> {
        let issuer = template
            .issuer
            .as_deref()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty());

        let issuer_match = issuer
            .as_deref()
            .is_some_and(|i| self.filename.contains(i) || self.text_contains(i));

        let base = base_name(name);
        let name_match = !base.is_empty() && self.stem.contains(&base);

        trace!(
            "template {}: issuer_match={} name_match={}",
            name, issuer_match, name_match
        );
        if !issuer_match && !name_match {
            return None;
        }

        let keyword_overlap = template
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && self.text_contains(k))
            .count();

        Some(TemplateMatch {
            name: name.to_string(),
            issuer_match,
            keyword_overlap,
            priority: template.priority,
        })
    }

    fn is_excluded(&self, name: &str, template: &ExtractionTemplate) -> bool {
        let excluded = template
            .exclude_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && self.text_contains(&k));
        if excluded {
            debug!("Template {} excluded by keyword", name);
        }
        excluded
    }
}
