//! Rule-based helpers shared by the extraction paths.

pub mod dates;
pub mod fields;
pub mod patterns;

pub use dates::{format_date, normalize_date, parse_date};
pub use fields::{apply_legacy_renames, is_blank, missing_required};
pub use patterns::*;
