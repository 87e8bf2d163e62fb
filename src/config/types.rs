use serde::Deserialize;
use std::time::Duration;

/// Manifest fetched when the config does not name one
pub const DEFAULT_MANIFEST_URL: &str = "https://languages.lingua-sync.org/bookmarks.json";

/// Main configuration structure for Lingua-Sync
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub store: StoreConfig,
}

/// Remote manifest and request behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// URL of the bookmarks manifest
    #[serde(rename = "manifest-url", default = "default_manifest_url")]
    pub manifest_url: String,

    /// Attempts per document, including the first request
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Base delay between retries (milliseconds), doubled on each attempt
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// How often a pending fetch is polled (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Refuse plain-HTTP URLs
    #[serde(rename = "https-only", default = "default_https_only")]
    pub https_only: bool,
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            https_only: default_https_only(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    pub name: String,

    pub version: String,

    /// URL with information about the client
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.contact_url)
    }
}

/// Local store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_https_only() -> bool {
    true
}
