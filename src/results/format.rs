//! Plain-text rendering of breach records for chat previews

use super::types::{BreachRecord, RECOGNIZED_FIELDS};
use std::fmt::Display;

/// Date placeholder used in previews
pub const PREVIEW_MISSING_DATE: &str = "No date";

/// Appended to a record cut short to fit the message limit
pub const TRUNCATED_MARKER: &str = "... (truncated)";

/// Render records as preview text.
///
/// An empty slice renders the "no breaches" sentence instead of a header.
pub fn format_breaches(term: &str, search_type: impl Display, records: &[BreachRecord]) -> String {
    if records.is_empty() {
        return format!("No breaches found for {} '{}'.", search_type, term);
    }

    let blocks: Vec<String> = records.iter().map(format_record).collect();
    format!("{}:\n\n{}", term, blocks.join("\n\n"))
}

/// Render records to fit `limit` characters.
///
/// When the full text is too long, each record gets an equal share of the
/// space left after the header and is cut to it. A share shorter than the
/// marker itself can overshoot the limit.
pub fn format_breaches_within(
    term: &str,
    search_type: impl Display,
    records: &[BreachRecord],
    limit: usize,
) -> String {
    let text = format_breaches(term, search_type, records);
    if records.is_empty() || text.chars().count() <= limit {
        return text;
    }

    let header = format!("{}:\n\n", term);
    let separators = (records.len() - 1) * 2;
    let share = limit.saturating_sub(header.chars().count() + separators) / records.len();

    let blocks: Vec<String> = records
        .iter()
        .map(|record| truncate_block(&format_record(record), share))
        .collect();
    format!("{}{}", header, blocks.join("\n\n"))
}

fn truncate_block(block: &str, share: usize) -> String {
    if block.chars().count() <= share {
        return block.to_string();
    }
    let keep = share.saturating_sub(TRUNCATED_MARKER.chars().count());
    let mut cut: String = block.chars().take(keep).collect();
    cut.push_str(TRUNCATED_MARKER);
    cut
}

/// Render one record: source line first, then every present recognized field
pub fn format_record(record: &BreachRecord) -> String {
    let (name, date) = record.source_parts(PREVIEW_MISSING_DATE);
    let mut lines = vec![format!("- Source: {} ({})", name, date)];

    for key in RECOGNIZED_FIELDS {
        if let Some(value) = record.field(key).filter(|v| !v.is_empty()) {
            lines.push(format!("  {}: {}", field_label(key), value));
        }
    }

    lines.join("\n")
}

/// `full_name` -> `Full name`
pub fn field_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> BreachRecord {
        BreachRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(
            format_breaches("bob", "username", &[]),
            "No breaches found for username 'bob'."
        );
    }

    #[test]
    fn test_format_skips_absent_and_empty_fields() {
        let records = vec![
            record(json!({
                "email": "bob@example.com",
                "password": "",
                "ip_address": "10.0.0.1",
                "source": {"name": "ExampleLeak", "date": "2021-03"}
            })),
            record(json!({"username": "bobby"})),
        ];

        let text = format_breaches("bob@example.com", "email", &records);
        assert_eq!(
            text,
            "bob@example.com:\n\n\
             - Source: ExampleLeak (2021-03)\n  Email: bob@example.com\n  Ip address: 10.0.0.1\n\n\
             - Source: Unknown source (No date)\n  Username: bobby"
        );
    }

    #[test]
    fn test_within_keeps_every_record() {
        let records: Vec<BreachRecord> = (0..4)
            .map(|i| {
                record(json!({
                    "username": format!("user{}", i),
                    "hash": "0".repeat(600)
                }))
            })
            .collect();

        let text = format_breaches_within("user", "username", &records, 2000);
        assert!(text.chars().count() <= 2000);
        assert!(text.starts_with("user:\n\n"));
        for i in 0..4 {
            assert!(text.contains(&format!("Username: user{}", i)));
        }
        assert_eq!(text.matches(TRUNCATED_MARKER).count(), 4);
    }

    #[test]
    fn test_within_leaves_short_text_alone() {
        let records = vec![record(json!({"username": "bobby"}))];
        assert_eq!(
            format_breaches_within("bob", "username", &records, 2000),
            format_breaches("bob", "username", &records)
        );
    }

    #[test]
    fn test_field_label() {
        assert_eq!(field_label("full_name"), "Full name");
        assert_eq!(field_label("ip_address"), "Ip address");
        assert_eq!(field_label("hash"), "Hash");
        assert_eq!(field_label(""), "");
    }
}
