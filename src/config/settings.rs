//! Settings structures for HackCheck-RS configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub rate_limit: RateLimitSettings,
    pub paginator: PaginatorSettings,
    pub reports: ReportSettings,
    pub cleanup: CleanupSettings,
    pub webhook: WebhookSettings,
    pub chat: ChatSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (HACKCHECK_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("HACKCHECK_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("HACKCHECK_API_KEY") {
            self.api.api_key = val;
        }
        if let Ok(val) = std::env::var("HACKCHECK_API_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("HACKCHECK_WEBHOOK_URL") {
            self.webhook.url = Some(val);
        }
        if let Ok(val) = std::env::var("HACKCHECK_OUTPUT_DIR") {
            self.reports.output_dir = PathBuf::from(val);
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            bail!("api.api_key is not set (use settings.yml or HACKCHECK_API_KEY)");
        }
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            bail!("api.base_url '{}' is not a valid URL: {}", self.api.base_url, e);
        }
        if self.api.page_limit == 0 || self.api.max_pages == 0 {
            bail!("api.page_limit and api.max_pages must be greater than zero");
        }
        if self.rate_limit.permits == 0 || self.rate_limit.period_secs == 0 {
            bail!("rate_limit.permits and rate_limit.period_secs must be greater than zero");
        }
        if self.paginator.page_size == 0 {
            bail!("paginator.page_size must be greater than zero");
        }
        if self.chat.message_limit == 0 {
            bail!("chat.message_limit must be greater than zero");
        }
        if let Some(ref url) = self.webhook.url {
            if let Err(e) = url::Url::parse(url) {
                bail!("webhook.url '{}' is not a valid URL: {}", url, e);
            }
        }
        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Directory for the rolling log file (none = stderr only)
    pub log_dir: Option<PathBuf>,
}

/// Upstream breach search API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the search API
    pub base_url: String,
    /// API key interpolated into the request path
    pub api_key: String,
    /// Total timeout per request in seconds
    pub request_timeout: f64,
    /// Records requested on the first page
    pub page_limit: u64,
    /// Hard cap on pages fetched per search
    pub max_pages: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.hackcheck.io".to_string(),
            api_key: String::new(),
            request_timeout: 120.0,
            page_limit: 75,
            max_pages: crate::DEFAULT_MAX_PAGES,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }
}

/// Outbound rate limit, shared by every search in the process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per period
    pub permits: u32,
    /// Period length in seconds
    pub period_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            permits: 8,
            period_secs: 1,
        }
    }
}

/// Interactive preview settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginatorSettings {
    /// Records shown per page
    pub page_size: usize,
    /// Seconds without navigation before the view freezes
    pub idle_timeout_secs: u64,
}

impl Default for PaginatorSettings {
    fn default() -> Self {
        Self {
            page_size: crate::DEFAULT_PAGE_SIZE,
            idle_timeout_secs: 30,
        }
    }
}

impl PaginatorSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Report artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory where artifacts are written before delivery
    pub output_dir: PathBuf,
    /// File name prefix shared by both artifacts
    pub prefix: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            prefix: "full_results".to_string(),
        }
    }
}

/// Artifact deletion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay_ms: 1000,
        }
    }
}

impl CleanupSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Notification webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Webhook URL (none = notifications disabled)
    pub url: Option<String>,
    /// Display name used for search notices
    pub username: String,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url: None,
            username: "HackCheck Bot".to_string(),
        }
    }
}

/// Host chat platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Maximum characters per message
    pub message_limit: usize,
    /// Where the console surface places uploaded files
    pub download_dir: PathBuf,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            message_limit: 2000,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api.page_limit, 75);
        assert_eq!(settings.api.max_pages, 75);
        assert_eq!(settings.api.timeout(), Duration::from_secs(120));
        assert_eq!(settings.rate_limit.permits, 8);
        assert_eq!(settings.paginator.page_size, 4);
        assert_eq!(settings.cleanup.max_attempts, 5);
        assert_eq!(settings.chat.message_limit, 2000);
        assert!(settings.webhook.url.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "api:\n  api_key: secret\npaginator: {}\nreports:\n  prefix: scan\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.api.api_key, "secret");
        assert_eq!(settings.api.base_url, "https://api.hackcheck.io");
        assert_eq!(settings.reports.prefix, "scan");
        assert_eq!(settings.paginator.idle_timeout_secs, 30);
    }

    #[test]
    fn test_validate() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_err());

        settings.api.api_key = "key".to_string();
        assert!(settings.validate().is_ok());

        settings.api.base_url = "not a url".to_string();
        assert!(settings.validate().is_err());

        settings.api.base_url = "http://localhost:8080".to_string();
        settings.paginator.page_size = 0;
        assert!(settings.validate().is_err());
    }
}
