//! HTTP client for talking to the breach search API and the webhook

use crate::config::ApiSettings;
use reqwest::{Client, Response};
use std::time::Duration;

/// Raw HTTP response, read fully into memory
#[derive(Debug)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl ApiResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.text)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client wrapper carrying the per-request timeout
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> reqwest::Result<Self> {
        Self::with_settings(&ApiSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &ApiSettings) -> reqwest::Result<Self> {
        let timeout = settings.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hackcheck-rs/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Total timeout applied to each request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Simple GET request
    pub async fn get(&self, url: &str) -> reqwest::Result<ApiResponse> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// POST with JSON body
    pub async fn post_json(
        &self,
        url: &str,
        json: &serde_json::Value,
    ) -> reqwest::Result<ApiResponse> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(json)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Parse response into ApiResponse
    async fn parse_response(response: Response) -> reqwest::Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok(ApiResponse { status, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().timeout(), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_get_reads_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"nope"}"#))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client.get(&format!("{}/ping", server.uri())).await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["error"], "nope");
    }
}
