//! Field-name migration and required-field validation.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::models::FieldMap;

/// Whether a value counts as absent for validation.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Move legacy keys onto their canonical names.
///
/// A rename only fires when the legacy key is present. An existing non-blank
/// canonical value is kept and the legacy key is dropped.
pub fn apply_legacy_renames(fields: &mut FieldMap, renames: &BTreeMap<String, String>) {
    for (legacy, canonical) in renames {
        let Some(value) = fields.remove(legacy) else {
            continue;
        };

        let keep_existing = fields.get(canonical).is_some_and(|v| !is_blank(v));
        if keep_existing {
            debug!("Dropping legacy field {} in favour of existing {}", legacy, canonical);
        } else {
            debug!("Renaming legacy field {} to {}", legacy, canonical);
            fields.insert(canonical.clone(), value);
        }
    }
}

/// Names of required fields that are absent or blank, in declaration order.
pub fn missing_required<'a, I>(fields: &FieldMap, required: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    required
        .into_iter()
        .filter(|name| fields.get(name.as_str()).is_none_or(is_blank))
        .cloned()
        .collect()
}
