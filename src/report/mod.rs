//! Full report generation
//!
//! Every non-empty result set becomes two files sharing one timestamp stem:
//! a CSV export and a PDF document rendered from that CSV.

mod document;
mod tabular;

pub use document::DocumentRenderer;
pub use tabular::{
    columns, parse_source_cell, read_table, source_cell, write_records, Table,
    EXPORT_MISSING_DATE, SOURCE_COLUMN,
};

use crate::config::ReportSettings;
use crate::results::BreachRecord;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Attempts at finding a free stem before giving up
const MAX_STEM_ATTEMPTS: u32 = 100;

/// The two files generated from one result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifactPair {
    pub tabular: PathBuf,
    pub document: PathBuf,
}

impl ReportArtifactPair {
    /// Shared file stem, e.g. `full_results_20240101120000`
    pub fn stem(&self) -> Option<&str> {
        self.tabular.file_stem().and_then(|s| s.to_str())
    }

    pub fn paths(&self) -> [&Path; 2] {
        [&self.tabular, &self.document]
    }
}

/// Writes report artifacts into the configured output directory
#[derive(Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    prefix: String,
    renderer: Arc<DocumentRenderer>,
}

impl ReportGenerator {
    pub fn new(settings: &ReportSettings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            prefix: settings.prefix.clone(),
            renderer: Arc::new(DocumentRenderer::new()),
        }
    }

    /// Generate both artifacts off the async executor.
    ///
    /// Returns `None` for an empty set or when anything fails; failures are
    /// logged here and never reach the caller.
    pub async fn generate(&self, records: Arc<Vec<BreachRecord>>) -> Option<ReportArtifactPair> {
        if records.is_empty() {
            return None;
        }

        let generator = self.clone();
        match tokio::task::spawn_blocking(move || generator.generate_blocking(&records)).await {
            Ok(Ok(pair)) => Some(pair),
            Ok(Err(e)) => {
                error!("Error generating reports: {:#}", e);
                None
            }
            Err(e) => {
                error!("Report generation task failed: {}", e);
                None
            }
        }
    }

    /// Synchronous generation; the CSV is removed again if the document fails
    pub fn generate_blocking(&self, records: &[BreachRecord]) -> Result<ReportArtifactPair> {
        let (stem, file) = self.create_tabular_file()?;
        let tabular = self.output_dir.join(format!("{}.csv", stem));

        let written = write_records(file, records)
            .with_context(|| format!("writing {}", tabular.display()));
        let document = written.and_then(|count| {
            let document = self.output_dir.join(format!("{}.pdf", stem));
            let title = format!("Breach report ({} records)", count);
            let pdf = self.renderer.render_csv(&tabular, &title)?;
            std::fs::write(&document, pdf)
                .with_context(|| format!("writing {}", document.display()))?;
            Ok(document)
        });

        match document {
            Ok(document) => {
                info!(
                    "Generated reports {} and {}",
                    tabular.display(),
                    document.display()
                );
                Ok(ReportArtifactPair { tabular, document })
            }
            Err(e) => {
                if let Err(remove_err) = std::fs::remove_file(&tabular) {
                    warn!(
                        "Could not remove partial report {}: {}",
                        tabular.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Claim `<prefix>_<YYYYMMDDHHMMSS>.csv`, adding `-N` when a concurrent
    /// search already took the same second
    fn create_tabular_file(&self) -> Result<(String, File)> {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let base = format!("{}_{}", self.prefix, timestamp);

        for attempt in 1..=MAX_STEM_ATTEMPTS {
            let stem = if attempt == 1 {
                base.clone()
            } else {
                format!("{}-{}", base, attempt)
            };
            let path = self.output_dir.join(format!("{}.csv", stem));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((stem, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("creating {}", path.display()));
                }
            }
        }

        anyhow::bail!("no free report name for stem {}", base)
    }
}
