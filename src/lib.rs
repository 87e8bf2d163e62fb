//! Lingua-Sync: remote language definition updater
//!
//! This crate downloads a bookmark manifest of language definitions, fetches
//! every bookmarked language, merges them into a local store and reports
//! which languages were added, updated or already current.

pub mod config;
pub mod fetch;
pub mod language;
pub mod output;
pub mod storage;
pub mod sync;

use thiserror::Error;

/// Main error type for Lingua-Sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Timed out fetching {url} after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    #[error("Failed to fetch {url}: {}", describe_failure(.status_code, .message))]
    FetchFailed {
        url: String,
        status_code: Option<u16>,
        message: String,
    },

    #[error("An update is already running")]
    AlreadyRunning,

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SyncError {
    /// Returns true if this error came from a fetch that did not succeed
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::FetchFailed { .. })
    }
}

fn describe_failure(status_code: &Option<u16>, message: &str) -> String {
    match status_code {
        Some(code) => format!("HTTP {}: {}", code, message),
        None => message.to_string(),
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Lingua-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{FetchOperation, FetchOutcome, FetchStatus, Fetcher, HttpFetcher};
pub use language::{Bookmarks, Language};
pub use output::{format_report, UpdateReport, UP_TO_DATE_MESSAGE};
pub use storage::{LanguageStore, MemoryLanguageStore, SqliteLanguageStore};
pub use sync::{ProgressSink, Reconciliation, ReconcileOutcome, UpdateState, Updater};
