//! HackCheck-RS: breach search orchestration
//!
//! A search walks the upstream API page by page under a process-wide rate
//! limit, shows the aggregated records as a paginated preview, exports them
//! as a CSV and a PDF document, delivers both, and deletes them again.

pub mod chat;
pub mod chunker;
pub mod cleanup;
pub mod config;
pub mod logging;
pub mod network;
pub mod notify;
pub mod paginator;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod search;

pub use config::Settings;
pub use pipeline::{SearchOutcome, SearchPipeline, SearchSession};
pub use results::BreachRecord;
pub use search::{SearchRequest, SearchType};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Records shown per preview page
pub const DEFAULT_PAGE_SIZE: usize = 4;

/// Default cap on pages fetched per search
pub const DEFAULT_MAX_PAGES: u32 = 75;
