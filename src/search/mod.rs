//! Breach search module
//!
//! Validates search requests, follows the search API's pagination cursor
//! under the shared rate limit, and aggregates the pages into one result set.

mod aggregator;
mod fetcher;
mod models;

pub use aggregator::ResultSet;
pub use fetcher::{FetchError, FetchedPages, PaginatedFetcher, StopReason};
pub use models::*;
