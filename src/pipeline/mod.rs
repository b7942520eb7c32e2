//! End-to-end handling of one search request

use crate::chat::{send_split, ChatSurface, DeliveryError};
use crate::cleanup::RetryingFileCleaner;
use crate::config::{PaginatorSettings, Settings};
use crate::network::{HttpClient, RequestGate};
use crate::notify::{Notifier, Origin, Requester, SearchNotice};
use crate::paginator::{InteractivePaginator, PageView, PreviewHandle};
use crate::report::{ReportArtifactPair, ReportGenerator};
use crate::search::{FetchError, PaginatedFetcher, ResultSet, SearchRequest, SearchType, ValidationError};
use futures::future::join;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const PROCESSING_MESSAGE: &str = "Processing your search. Please wait...";
pub const UPSTREAM_ERROR_MESSAGE: &str =
    "An error occurred while processing your request. Please try again later.";
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "The breach search service could not be reached. Please try again later.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";
pub const PARTIAL_RESULTS_MESSAGE: &str =
    "Only part of the results could be retrieved. Please try again later for the full set.";
pub const TABULAR_CAPTION: &str = "Here's the full report in CSV format:";
pub const DOCUMENT_CAPTION: &str = "Here's the full report in PDF format:";

/// One user-initiated search
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub requester: Requester,
    pub origin: Origin,
    pub search_type: SearchType,
    pub term: String,
}

impl SearchSession {
    pub fn new(
        requester: Requester,
        origin: Origin,
        search_type: SearchType,
        term: impl Into<String>,
    ) -> Self {
        Self {
            requester,
            origin,
            search_type,
            term: term.into(),
        }
    }
}

/// What happened to a search
pub enum SearchOutcome {
    /// The term failed validation; nothing was sent upstream
    Rejected(ValidationError),
    /// The fetch failed and the user was told so
    Failed(FetchError),
    Completed(CompletedSearch),
}

impl SearchOutcome {
    pub fn completed(self) -> Option<CompletedSearch> {
        match self {
            SearchOutcome::Completed(done) => Some(done),
            _ => None,
        }
    }
}

pub struct CompletedSearch {
    pub results: ResultSet,
    /// Running preview, if it could be sent
    pub preview: Option<PreviewHandle>,
    pub reports: Option<ReportArtifactPair>,
    /// Both reports and the closing message were delivered
    pub delivered: bool,
}

/// Wires fetcher, preview, reports and cleanup together
#[derive(Clone)]
pub struct SearchPipeline {
    fetcher: PaginatedFetcher,
    reports: ReportGenerator,
    cleaner: RetryingFileCleaner,
    notifier: Notifier,
    page_size: usize,
    idle_timeout: Duration,
}

impl SearchPipeline {
    pub fn new(
        fetcher: PaginatedFetcher,
        reports: ReportGenerator,
        cleaner: RetryingFileCleaner,
        notifier: Notifier,
        paginator: &PaginatorSettings,
    ) -> Self {
        Self {
            fetcher,
            reports,
            cleaner,
            notifier,
            page_size: paginator.page_size,
            idle_timeout: paginator.idle_timeout(),
        }
    }

    /// Build every component from settings, sharing `gate` across fetchers
    pub fn from_settings(settings: &Settings, gate: Arc<dyn RequestGate>) -> anyhow::Result<Self> {
        let client = HttpClient::with_settings(&settings.api)?;
        let fetcher = PaginatedFetcher::new(client.clone(), gate, &settings.api);
        let reports = ReportGenerator::new(&settings.reports);
        let cleaner = RetryingFileCleaner::from_settings(&settings.cleanup);
        let notifier = Notifier::new(client, &settings.webhook);
        Ok(Self::new(
            fetcher,
            reports,
            cleaner,
            notifier,
            &settings.paginator,
        ))
    }

    /// Run one search against `surface`. Never panics on I/O failures;
    /// every failure is logged and turned into a user-facing message.
    pub async fn run(&self, surface: Arc<dyn ChatSurface>, session: SearchSession) -> SearchOutcome {
        info!(
            "{} searched for '{}' from '{}' at '{}'",
            session.requester,
            session.term,
            session.origin.channel_name(),
            session.origin.server_name()
        );

        let request = match SearchRequest::new(session.search_type, session.term.as_str()) {
            Ok(request) => request,
            Err(e) => {
                info!("Rejected {} search: {}", session.search_type, e);
                notify_user(surface.as_ref(), &e.to_string()).await;
                return SearchOutcome::Rejected(e);
            }
        };

        let notice = self.notifier.spawn_search(SearchNotice {
            requester: session.requester.clone(),
            term: session.term.clone(),
            origin: session.origin.clone(),
        });
        if notice.is_none() {
            debug!("Webhook disabled, no search notice posted");
        }

        notify_user(surface.as_ref(), PROCESSING_MESSAGE).await;

        let pages = match self.fetcher.fetch(&request).await {
            Ok(pages) => pages,
            Err(e) => {
                error!("{}", e);
                let message = match e {
                    FetchError::Upstream { .. } => UPSTREAM_ERROR_MESSAGE,
                    FetchError::Transport(_) => TRANSPORT_ERROR_MESSAGE,
                    FetchError::Decode(_) => UNEXPECTED_ERROR_MESSAGE,
                };
                notify_user(surface.as_ref(), message).await;
                return SearchOutcome::Failed(e);
            }
        };
        debug!(
            "Fetched {} records in {} requests ({:?})",
            pages.records.len(),
            pages.requests,
            pages.stop
        );

        let results = ResultSet::from_pages(pages);
        if results.is_partial() {
            warn!(
                "Search for '{}' returned partial results: {:?}",
                request.term(),
                results.stop_reason()
            );
            notify_user(surface.as_ref(), PARTIAL_RESULTS_MESSAGE).await;
        }

        let paginator = InteractivePaginator::new(surface.clone(), self.idle_timeout);
        let view = PageView::new(
            results.shared(),
            request.term(),
            request.search_type(),
            self.page_size,
            surface.message_limit(),
        );
        let (preview, reports) = tokio::join!(
            paginator.start(view),
            self.reports.generate(results.shared())
        );

        let preview = match preview {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Failed to send preview: {}", e);
                None
            }
        };

        let mut delivered = false;
        if let Some(ref pair) = reports {
            match deliver(
                surface.as_ref(),
                pair,
                request.term(),
                &session.requester.display_name,
            )
            .await
            {
                Ok(()) => delivered = true,
                Err(e) => error!("Error sending reports: {}", e),
            }
            self.cleanup(pair).await;
        }

        SearchOutcome::Completed(CompletedSearch {
            results,
            preview,
            reports,
            delivered,
        })
    }

    /// Delete both artifacts concurrently
    async fn cleanup(&self, pair: &ReportArtifactPair) {
        let (tabular, document) = join(
            self.cleaner.delete(&pair.tabular),
            self.cleaner.delete(&pair.document),
        )
        .await;
        debug!("Cleanup: tabular={}, document={}", tabular, document);
    }
}

async fn deliver(
    surface: &dyn ChatSurface,
    pair: &ReportArtifactPair,
    term: &str,
    display_name: &str,
) -> Result<(), DeliveryError> {
    surface.upload(TABULAR_CAPTION, &pair.tabular).await?;
    surface.upload(DOCUMENT_CAPTION, &pair.document).await?;
    let finished = format!("Finished searching `{}` for `{}`", term, display_name);
    send_split(surface, &finished, None).await?;
    Ok(())
}

async fn notify_user(surface: &dyn ChatSurface, message: &str) {
    if let Err(e) = send_split(surface, message, None).await {
        warn!("Failed to send message: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MemorySurface;
    use crate::config::{ApiSettings, ReportSettings};
    use crate::network::RateLimiter;
    use serde_json::json;
    use std::path::Path;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline(base_url: &str, output_dir: &Path) -> SearchPipeline {
        pipeline_with_timeout(base_url, output_dir, 5.0)
    }

    fn pipeline_with_timeout(base_url: &str, output_dir: &Path, timeout: f64) -> SearchPipeline {
        let api = ApiSettings {
            base_url: base_url.to_string(),
            api_key: "KEY".to_string(),
            request_timeout: timeout,
            ..Default::default()
        };
        let client = HttpClient::with_settings(&api).unwrap();
        let gate: Arc<dyn RequestGate> = Arc::new(RateLimiter::default());
        SearchPipeline::new(
            PaginatedFetcher::new(client.clone(), gate, &api),
            ReportGenerator::new(&ReportSettings {
                output_dir: output_dir.to_path_buf(),
                prefix: "full_results".to_string(),
            }),
            RetryingFileCleaner::new(5, Duration::from_millis(1)),
            Notifier::disabled(client),
            &PaginatorSettings {
                page_size: 4,
                idle_timeout_secs: 1,
            },
        )
    }

    fn session(search_type: SearchType, term: &str) -> SearchSession {
        SearchSession::new(
            Requester::new("neo"),
            Origin::DirectMessage,
            search_type,
            term,
        )
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let outcome = pipeline(&server.uri(), dir.path())
            .run(surface.clone(), session(SearchType::Email, "not-an-email"))
            .await;

        assert!(matches!(
            outcome,
            SearchOutcome::Rejected(ValidationError::InvalidEmail)
        ));
        assert_eq!(
            surface.sent(),
            vec!["The provided email is invalid. Please enter a valid email address."]
        );
    }

    #[tokio::test]
    async fn test_upstream_error_reaches_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "bad key"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let outcome = pipeline(&server.uri(), dir.path())
            .run(surface.clone(), session(SearchType::Username, "neo"))
            .await;

        assert!(matches!(
            outcome,
            SearchOutcome::Failed(FetchError::Upstream { status: 403, .. })
        ));
        assert_eq!(
            surface.sent(),
            vec![PROCESSING_MESSAGE, UPSTREAM_ERROR_MESSAGE]
        );
    }

    #[tokio::test]
    async fn test_completed_search_delivers_and_cleans_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/KEY/username/neo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"username": "neo", "email": "a@matrix.io"},
                    {"username": "neo", "email": "b@matrix.io"},
                    {"username": "neo", "email": "c@matrix.io"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let done = pipeline(&server.uri(), dir.path())
            .run(surface.clone(), session(SearchType::Username, "neo"))
            .await
            .completed()
            .unwrap();

        assert_eq!(done.results.len(), 3);
        assert_eq!(done.results.records()[0].field("email").unwrap(), "c@matrix.io");
        assert!(done.delivered);

        let sent = surface.sent();
        assert_eq!(sent[0], PROCESSING_MESSAGE);
        assert!(sent[1].starts_with("neo:\n\n"));
        assert_eq!(sent.last().unwrap(), "Finished searching `neo` for `neo`");

        let uploads = surface.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, TABULAR_CAPTION);
        assert_eq!(uploads[1].0, DOCUMENT_CAPTION);
        assert!(String::from_utf8_lossy(&uploads[0].2).starts_with("username,email,source"));
        assert!(uploads[1].2.starts_with(b"%PDF"));

        let pair = done.reports.unwrap();
        assert_eq!(pair.document.extension().unwrap(), "pdf");
        assert!(!pair.tabular.exists());
        assert!(!pair.document.exists());
    }

    #[tokio::test]
    async fn test_interrupted_search_tells_user_results_are_partial() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"username": "neo", "email": "a@matrix.io"}],
                "pagination": {"next": {"offset": 1, "limit": 75}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("offset", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let done = pipeline_with_timeout(&server.uri(), dir.path(), 0.5)
            .run(surface.clone(), session(SearchType::Username, "neo"))
            .await
            .completed()
            .unwrap();

        assert!(done.results.is_partial());
        assert_eq!(done.results.len(), 1);
        assert!(done.delivered);

        let sent = surface.sent();
        assert_eq!(sent[0], PROCESSING_MESSAGE);
        assert_eq!(sent[1], PARTIAL_RESULTS_MESSAGE);
        assert!(sent[2].starts_with("neo:\n\n"));
    }

    #[tokio::test]
    async fn test_complete_search_has_no_partial_notice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [{"username": "neo"}]})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(MemorySurface::new());
        pipeline(&server.uri(), dir.path())
            .run(surface.clone(), session(SearchType::Username, "neo"))
            .await;

        assert!(!surface.sent().iter().any(|m| m == PARTIAL_RESULTS_MESSAGE));
    }

    #[tokio::test]
    async fn test_files_deleted_when_delivery_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [{"password": "hunter2"}]})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(MemorySurface::new().failing_uploads());
        let done = pipeline(&server.uri(), dir.path())
            .run(surface.clone(), session(SearchType::Password, "hunter2"))
            .await
            .completed()
            .unwrap();

        assert!(!done.delivered);
        assert!(surface.uploads().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_results_skip_reports() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let done = pipeline(&server.uri(), dir.path())
            .run(surface.clone(), session(SearchType::Domain, "nothing.io"))
            .await
            .completed()
            .unwrap();

        assert!(done.results.is_empty());
        assert!(done.reports.is_none());
        assert_eq!(
            surface.sent(),
            vec![
                PROCESSING_MESSAGE,
                "No breaches found for domain 'nothing.io'."
            ]
        );
    }
}
