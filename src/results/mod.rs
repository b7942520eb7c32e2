//! Breach record types and preview formatting
//!
//! Records are parsed once from the search API and then shared read-only
//! between the preview paginator and the report generator.

mod format;
mod types;

pub use format::{
    field_label, format_breaches, format_breaches_within, format_record, PREVIEW_MISSING_DATE,
    TRUNCATED_MARKER,
};
pub use types::*;
