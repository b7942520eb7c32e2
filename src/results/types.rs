//! Breach record and upstream page types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields shown in previews, in display order
pub const RECOGNIZED_FIELDS: [&str; 7] = [
    "email",
    "password",
    "username",
    "full_name",
    "ip_address",
    "phone_number",
    "hash",
];

/// Placeholder for a source without a name
pub const UNKNOWN_SOURCE: &str = "Unknown source";

/// One leaked-data entry as returned by the search API.
///
/// Upstream records are heterogeneous, so everything except `source` is kept
/// as an ordered JSON map. Absent fields stay absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreachRecord {
    /// Where the entry was leaked
    #[serde(
        default,
        deserialize_with = "lenient_source",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<BreachSource>,
    /// Every other field, in upstream order
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl BreachRecord {
    /// Build a record from a JSON object (handy for tests and fixtures)
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Display value of a field, `None` when absent or null
    pub fn field(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(value_to_text)
    }

    /// Field names in upstream order, excluding `source`
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// `(name, date)` of the source with independent placeholders
    pub fn source_parts(&self, missing_date: &'static str) -> (String, String) {
        let source = self.source.as_ref();
        let name = source
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
        let date = source
            .and_then(|s| s.date.clone())
            .unwrap_or_else(|| missing_date.to_string());
        (name, date)
    }
}

/// Nested `source` object of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Accept any JSON for `source`; only an object's `name`/`date` are read.
fn lenient_source<'de, D>(deserializer: D) -> Result<Option<BreachSource>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => Some(BreachSource {
            name: map.get("name").and_then(value_to_text),
            date: map.get("date").and_then(value_to_text),
        }),
        Some(Value::Null) | None => None,
        Some(other) => Some(BreachSource {
            name: value_to_text(&other),
            date: None,
        }),
    })
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Server-issued cursor for the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCursor {
    pub offset: u64,
    pub limit: u64,
}

impl PaginationCursor {
    /// Parse a `pagination.next` value; `None` when `offset` or `limit` is missing
    pub fn from_next(next: &Value) -> Option<Self> {
        let offset = next.get("offset")?.as_u64()?;
        let limit = next.get("limit")?.as_u64()?;
        Some(Self { offset, limit })
    }
}

/// Successful page body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub results: Vec<BreachRecord>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl SearchPage {
    /// Raw `pagination.next`, treating `null` as absent
    pub fn next(&self) -> Option<&Value> {
        self.pagination
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next: Option<Value>,
}

/// Error body returned with a non-success status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<Value>,
}

impl ErrorBody {
    /// Extract the `error` message from a raw body
    pub fn message_from(text: &str) -> String {
        serde_json::from_str::<ErrorBody>(text)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| value_to_text(&e))
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}
