//! Invoice field extraction: the primary parser adapter and the template
//! fallback.

mod fallback;
mod primary;
pub mod rules;

pub use fallback::FallbackExtractor;
pub use primary::{recover_structured_output, AdapterError, Invoice2DataParser, PrimaryParser};
