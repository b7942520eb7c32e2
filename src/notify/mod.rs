//! Webhook notifications about searches and new servers
//!
//! Notifications are fire-and-forget: a failed post is logged and dropped.

mod embeds;

pub use embeds::{search_embed, server_join_embed, Origin, Requester, SearchNotice, ServerJoinNotice};

use crate::chunker::{chunk, ChunkError};
use crate::config::WebhookSettings;
use crate::network::HttpClient;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Longest follow-up body before it is split into parts
pub const FOLLOW_UP_LIMIT: usize = 1900;

/// Username shown on server-join notices
const SERVER_JOIN_USERNAME: &str = "Bot Server Count Update";

/// Posts notices to the configured webhook
#[derive(Clone)]
pub struct Notifier {
    client: HttpClient,
    url: Option<String>,
    username: String,
}

impl Notifier {
    pub fn new(client: HttpClient, settings: &WebhookSettings) -> Self {
        Self {
            client,
            url: settings.url.clone(),
            username: settings.username.clone(),
        }
    }

    /// Notifier that never posts
    pub fn disabled(client: HttpClient) -> Self {
        Self {
            client,
            url: None,
            username: WebhookSettings::default().username,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Post a search notice. Returns whether the webhook accepted it.
    pub async fn notify_search(&self, notice: &SearchNotice) -> bool {
        let payload = json!({
            "content": Value::Null,
            "username": self.username,
            "embeds": [search_embed(notice, chrono::Utc::now())],
        });
        self.post(&payload, "Webhook failed").await
    }

    /// Post a search notice in the background
    pub fn spawn_search(&self, notice: SearchNotice) -> Option<JoinHandle<bool>> {
        if !self.is_enabled() {
            return None;
        }
        let notifier = self.clone();
        Some(tokio::spawn(async move { notifier.notify_search(&notice).await }))
    }

    /// Post the server-join embed followed by channel and member listings.
    ///
    /// Returns how many posts were accepted.
    pub async fn notify_server_join(&self, notice: &ServerJoinNotice) -> usize {
        if !self.is_enabled() {
            return 0;
        }

        let payload = json!({
            "username": SERVER_JOIN_USERNAME,
            "embeds": [server_join_embed(notice)],
        });
        let mut accepted = 0;
        if self
            .post(&payload, "Webhook for new server join failed")
            .await
        {
            info!(
                "New server join: {}, owned by {}. Total servers: {}",
                notice.name,
                notice.owner_display(),
                notice.total_servers
            );
            accepted += 1;
        }

        let follow_ups = listing_messages("📺", "Channel Names", &notice.channel_names)
            .into_iter()
            .chain(listing_messages("👥", "Member Names", &notice.member_names));
        for content in follow_ups {
            if self
                .post(&json!({ "content": content }), "Failed to send webhook message")
                .await
            {
                accepted += 1;
            }
        }
        accepted
    }

    async fn post(&self, payload: &Value, failure: &str) -> bool {
        let Some(ref url) = self.url else {
            debug!("Webhook disabled, skipping notification");
            return false;
        };

        match self.client.post_json(url, payload).await {
            Ok(response) if response.status == 204 => true,
            Ok(response) => {
                error!("{} with status code {}", failure, response.status);
                false
            }
            Err(e) => {
                error!("An error occurred while sending the webhook message: {}", e);
                false
            }
        }
    }
}

/// `- name` lines under a bold title, split into numbered parts when long
pub fn listing_messages(icon: &str, title: &str, names: &[String]) -> Vec<String> {
    let body = names
        .iter()
        .map(|n| format!("- {}", n))
        .collect::<Vec<_>>()
        .join("\n");

    let parts = match chunk(&body, FOLLOW_UP_LIMIT, None) {
        Ok(parts) => parts,
        Err(ChunkError::NothingToSend) => return Vec::new(),
        Err(e) => {
            warn!("Could not split {} listing: {}", title, e);
            return Vec::new();
        }
    };

    let total = parts.len();
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            let part = part.trim_end_matches('\n');
            if total == 1 {
                format!("{} **{}:**\n{}", icon, title, part)
            } else {
                format!("{} **{} (Part {}/{}):**\n{}", icon, title, i + 1, total, part)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(url: Option<String>) -> Notifier {
        Notifier::new(
            HttpClient::new().unwrap(),
            &WebhookSettings {
                url,
                username: "HackCheck Bot".to_string(),
            },
        )
    }

    fn search_notice() -> SearchNotice {
        SearchNotice {
            requester: Requester::new("neo"),
            term: "neo@matrix.io".to_string(),
            origin: Origin::DirectMessage,
        }
    }

    fn join_notice(members: usize) -> ServerJoinNotice {
        ServerJoinNotice {
            id: 42,
            name: "Zion".to_string(),
            owner: Some("morpheus".to_string()),
            owner_id: 7,
            member_count: members as u64,
            role_count: 3,
            text_channels: 2,
            voice_channels: 1,
            categories: 1,
            created_at: chrono::Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap(),
            region: None,
            emojis: vec![],
            icon_url: None,
            total_servers: 12,
            channel_names: vec!["general".to_string(), "ops".to_string()],
            member_names: (0..members).map(|i| format!("member-{:04}", i)).collect(),
        }
    }

    #[tokio::test]
    async fn test_search_notice_posts_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier(Some(format!("{}/hook", server.uri())));
        assert!(notifier.notify_search(&search_notice()).await);

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["username"], "HackCheck Bot");
        assert_eq!(body["embeds"][0]["title"], "🔍 New Search Performed");
        assert_eq!(body["embeds"][0]["color"], 3447003);
    }

    #[tokio::test]
    async fn test_non_204_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let notifier = notifier(Some(server.uri()));
        assert!(!notifier.notify_search(&search_notice()).await);
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_silent() {
        let notifier = notifier(None);
        assert!(!notifier.is_enabled());
        assert!(notifier.spawn_search(search_notice()).is_none());
        assert_eq!(notifier.notify_server_join(&join_notice(3)).await, 0);
    }

    #[tokio::test]
    async fn test_server_join_sends_embed_and_listings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let notifier = notifier(Some(server.uri()));
        let accepted = notifier.notify_server_join(&join_notice(300)).await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(accepted, requests.len());
        let bodies: Vec<Value> = requests
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();
        assert_eq!(bodies[0]["embeds"][0]["color"], 3066993);
        assert_eq!(bodies[1]["content"], "📺 **Channel Names:**\n- general\n- ops");
        assert!(bodies[2]["content"]
            .as_str()
            .unwrap()
            .starts_with("👥 **Member Names (Part 1/"));
        assert!(bodies.len() > 3);
    }

    #[test]
    fn test_listing_parts_fit_limit() {
        let names: Vec<String> = (0..500).map(|i| format!("name-{:05}", i)).collect();
        let messages = listing_messages("👥", "Member Names", &names);
        let total = messages.len();
        assert!(total > 1);
        for (i, m) in messages.iter().enumerate() {
            assert!(m.starts_with(&format!("👥 **Member Names (Part {}/{}):**\n", i + 1, total)));
            assert!(m.chars().count() <= FOLLOW_UP_LIMIT + 40);
        }
        assert!(listing_messages("📺", "Channel Names", &[]).is_empty());
    }
}
