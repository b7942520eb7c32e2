//! Aggregation of fetched pages into one display-ordered result set

use super::fetcher::{FetchedPages, StopReason};
use crate::results::BreachRecord;
use std::sync::Arc;

/// Aggregated records, most recent first, shared read-only by the preview
/// and the report generator
#[derive(Debug, Clone)]
pub struct ResultSet {
    records: Arc<Vec<BreachRecord>>,
    stop: StopReason,
}

impl ResultSet {
    /// Reverse the fetched list once; pages themselves are never reordered
    pub fn from_pages(pages: FetchedPages) -> Self {
        let mut records = pages.records;
        records.reverse();
        Self {
            records: Arc::new(records),
            stop: pages.stop,
        }
    }

    pub fn records(&self) -> &[BreachRecord] {
        &self.records
    }

    /// Handle for consumers that outlive the borrow
    pub fn shared(&self) -> Arc<Vec<BreachRecord>> {
        Arc::clone(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stop_reason(&self) -> &StopReason {
        &self.stop
    }

    /// True when a transport failure cut the fetch short
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopReason::Interrupted(_))
    }
}
