//! CSV export of breach records

use crate::results::BreachRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Name of the synthetic column holding the flattened source
pub const SOURCE_COLUMN: &str = "source";

/// Date placeholder used in the tabular export
pub const EXPORT_MISSING_DATE: &str = "No date provided";

/// `Name: <name>, Date: <date>` for the source column
pub fn source_cell(record: &BreachRecord) -> String {
    let (name, date) = record.source_parts(EXPORT_MISSING_DATE);
    format!("Name: {}, Date: {}", name, date)
}

/// Split a source cell back into `(name, date)`
pub fn parse_source_cell(cell: &str) -> Option<(&str, &str)> {
    cell.strip_prefix("Name: ")?.rsplit_once(", Date: ")
}

/// Columns for a record set: the first record's keys, then `source`.
///
/// Later records are not reconciled against this set.
pub fn columns(records: &[BreachRecord]) -> Vec<String> {
    let mut columns: Vec<String> = records
        .first()
        .map(|r| r.keys().map(str::to_string).collect())
        .unwrap_or_default();
    columns.push(SOURCE_COLUMN.to_string());
    columns
}

/// Write one row per record into an already created file
pub fn write_records(file: File, records: &[BreachRecord]) -> Result<usize> {
    let columns = columns(records);
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&columns)?;

    for (index, record) in records.iter().enumerate() {
        let extra = record.keys().filter(|k| !columns.iter().any(|c| c == k)).count();
        if extra > 0 {
            debug!("Record {} has {} fields outside the report columns", index, extra);
        }

        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                if column == SOURCE_COLUMN {
                    source_cell(record)
                } else {
                    record.field(column).unwrap_or_default()
                }
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(records.len())
}

/// A CSV file read back into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a CSV written by [`write_records`]
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|row| row.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
    Ok(Table { headers, rows })
}
