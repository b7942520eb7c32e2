//! Cursor-following retrieval from the breach search API

use super::models::SearchRequest;
use crate::config::ApiSettings;
use crate::network::{HttpClient, RequestGate};
use crate::results::{BreachRecord, ErrorBody, PaginationCursor, SearchPage};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// A fetch that produced no usable result set
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success status from the search API
    #[error("API Error: {message} (HTTP {status})")]
    Upstream { status: u16, message: String },
    /// Network failure or timeout before any page arrived
    #[error("request to the search API failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// Success status but a body that is not a search page
    #[error("failed to decode search API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why the page loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Last page had no `pagination.next`
    Exhausted,
    /// `max_pages` pages were fetched
    PageCap,
    /// `pagination.next` lacked `offset` or `limit`
    MalformedCursor,
    /// A later page failed in transit; earlier pages are kept
    Interrupted(String),
}

/// Records from every page fetched, in upstream order
#[derive(Debug, Clone)]
pub struct FetchedPages {
    pub records: Vec<BreachRecord>,
    /// HTTP requests issued, including a failed last one
    pub requests: u32,
    pub stop: StopReason,
}

impl FetchedPages {
    /// True when the set ended on the server's own termination signal
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Exhausted
    }
}

/// Issues sequential page requests, following the server cursor
#[derive(Clone)]
pub struct PaginatedFetcher {
    client: HttpClient,
    gate: Arc<dyn RequestGate>,
    base_url: String,
    api_key: String,
    page_limit: u64,
    max_pages: u32,
}

impl PaginatedFetcher {
    pub fn new(client: HttpClient, gate: Arc<dyn RequestGate>, settings: &ApiSettings) -> Self {
        Self {
            client,
            gate,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            page_limit: settings.page_limit,
            max_pages: settings.max_pages,
        }
    }

    /// Override the page cap
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Fetch up to the configured page cap
    pub async fn fetch(&self, request: &SearchRequest) -> Result<FetchedPages, FetchError> {
        self.fetch_pages(request, self.max_pages).await
    }

    /// Fetch pages until the cursor runs out, `max_pages` is reached, or a
    /// request fails. Pages are strictly sequential: the next cursor is only
    /// known once the previous response has been read.
    pub async fn fetch_pages(
        &self,
        request: &SearchRequest,
        max_pages: u32,
    ) -> Result<FetchedPages, FetchError> {
        let mut cursor = PaginationCursor {
            offset: 0,
            limit: self.page_limit,
        };
        let mut records = Vec::new();
        let mut page_count = 0u32;
        let mut requests = 0u32;

        let stop = loop {
            if page_count >= max_pages {
                break StopReason::PageCap;
            }

            self.gate.acquire().await;
            requests += 1;

            debug!(
                "Requesting {} page {} (offset={}, limit={})",
                request.search_type(),
                page_count + 1,
                cursor.offset,
                cursor.limit
            );

            let response = match self.client.get(&self.page_url(request, cursor)).await {
                Ok(response) => response,
                Err(e) => {
                    error!(
                        "Transport error on page {} of {} search: {}",
                        page_count + 1,
                        request.search_type(),
                        e
                    );
                    if records.is_empty() {
                        return Err(FetchError::Transport(e));
                    }
                    break StopReason::Interrupted(e.to_string());
                }
            };

            if !response.is_success() {
                let message = ErrorBody::message_from(&response.text);
                error!("API Error: {}", message);
                error!("API Response: {}", response.text);
                return Err(FetchError::Upstream {
                    status: response.status,
                    message,
                });
            }

            let page: SearchPage = response.json().map_err(|e| {
                error!("Undecodable search response: {}", e);
                FetchError::Decode(e)
            })?;

            let next = page.next().cloned();
            records.extend(page.results);
            page_count += 1;

            match next {
                None => break StopReason::Exhausted,
                Some(next) => match PaginationCursor::from_next(&next) {
                    Some(c) => cursor = c,
                    None => {
                        warn!("Malformed pagination cursor {}, stopping", next);
                        break StopReason::MalformedCursor;
                    }
                },
            }
        };

        info!(
            "Fetched {} records in {} pages for {} search ({:?})",
            records.len(),
            page_count,
            request.search_type(),
            stop
        );

        Ok(FetchedPages {
            records,
            requests,
            stop,
        })
    }

    /// The term goes into the path as-is; [`SearchRequest`] has validated it
    fn page_url(&self, request: &SearchRequest, cursor: PaginationCursor) -> String {
        format!(
            "{}/search/{}/{}/{}?offset={}&limit={}",
            self.base_url,
            self.api_key,
            request.search_type().path_segment(),
            request.term(),
            cursor.offset,
            cursor.limit
        )
    }
}
