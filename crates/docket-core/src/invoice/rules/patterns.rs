//! Common regex patterns used by the extraction paths.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // First brace to last brace, across lines
    pub static ref OBJECT_LITERAL: Regex = Regex::new(
        r"(?s)\{.*\}"
    ).unwrap();

    // datetime.datetime(2024, 1, 5, 0, 0) as printed by the primary parser
    pub static ref DATETIME_CALL: Regex = Regex::new(
        r"datetime\.datetime\((\d{4}),\s*(\d{1,2}),\s*(\d{1,2})(?:,\s*\d+)*\)"
    ).unwrap();

    // Diagnostic emitted when no primary template fits the document
    pub static ref NO_TEMPLATE: Regex = Regex::new(
        r"(?i)no template"
    ).unwrap();

    // Trailing suffix that marks fallback templates
    pub static ref RAW_SUFFIX: Regex = Regex::new(
        r"(?i)_raw$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_literal_is_greedy() {
        let text = "log {'a': 1} more {'b': 2} tail";
        assert_eq!(OBJECT_LITERAL.find(text).unwrap().as_str(), "{'a': 1} more {'b': 2}");
    }

    #[test]
    fn test_datetime_call_with_time_parts() {
        let caps = DATETIME_CALL.captures("datetime.datetime(2024, 3, 9, 0, 0)").unwrap();
        assert_eq!((&caps[1], &caps[2], &caps[3]), ("2024", "3", "9"));
        assert!(DATETIME_CALL.is_match("datetime.datetime(2024, 12, 31)"));
    }

    #[test]
    fn test_raw_suffix() {
        assert_eq!(RAW_SUFFIX.replace("Acme_raw", ""), "Acme");
        assert_eq!(RAW_SUFFIX.replace("raw_acme", ""), "raw_acme");
    }
}
