//! Date normalization for extracted invoice fields.

use chrono::{Datelike, NaiveDate};
use tracing::trace;

/// Parse `value` against each format in order and render the first hit
/// as `M/D/YYYY`. Returns `None` when no format accepts the value.
pub fn parse_date<'a, I>(value: &str, formats: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a str>,
{
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    formats.into_iter().find_map(|format| {
        let parsed = NaiveDate::parse_from_str(value, format).ok();
        trace!("date {:?} against {:?}: {:?}", value, format, parsed);
        parsed
    })
}

/// Canonical rendering: no zero padding, four digit year.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Normalize a date string, leaving it untouched when nothing parses.
pub fn normalize_date<'a, I>(value: &str, formats: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    match parse_date(value, formats) {
        Some(date) => format_date(date),
        None => value.to_string(),
    }
}
