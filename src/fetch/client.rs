//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building HTTP clients with the configured user agent
//! - GET requests for JSON documents
//! - Retry logic for transient failures
//! - Error classification into `Failed` and `Timeout`

use crate::config::{RemoteConfig, UserAgentConfig};
use crate::fetch::{FetchFailure, FetchOperation, FetchOutcome, Fetcher};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use lingua_sync::config::{RemoteConfig, UserAgentConfig};
/// use lingua_sync::fetch::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     name: "LinguaSync".to_string(),
///     version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &RemoteConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    remote: &RemoteConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(remote.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .https_only(remote.https_only)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetcher` backed by `reqwest`
///
/// Every fetch runs on its own tokio task, so `fetch` must be called from
/// within a tokio runtime.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(client: Client, retry_delay: Duration) -> Self {
        Self {
            client,
            retry_delay,
        }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        remote: &RemoteConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, remote)?;
        Ok(Self::new(client, remote.retry_delay()))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<T>(&self, url: &str, max_attempts: u32) -> FetchOperation<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (operation, completer) = FetchOperation::channel(url);
        let client = self.client.clone();
        let retry_delay = self.retry_delay;
        let url = url.to_string();

        tokio::spawn(async move {
            let outcome = fetch_json_while(&client, &url, max_attempts, retry_delay, || {
                !completer.is_abandoned()
            })
            .await;
            completer.complete(outcome);
        });

        operation
    }
}

/// What a single attempt concluded
enum Attempt<T> {
    Done(FetchOutcome<T>),
    Retry(FetchOutcome<T>),
}

/// Fetches a JSON document with retry
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx, decodes | Success |
/// | 2xx, decode error | Immediate → Failed |
/// | HTTP 408/429/500/502/503/504 | Retry, then → Failed with that code |
/// | Other non-2xx | Immediate → Failed |
/// | Timeout | Retry, then → Timeout |
/// | Connection error | Retry, then → Failed |
/// | Other transport error | Immediate → Failed |
///
/// A `max_attempts` of 0 still performs one request.
pub async fn fetch_json<T>(
    client: &Client,
    url: &str,
    max_attempts: u32,
    retry_delay: Duration,
) -> FetchOutcome<T>
where
    T: DeserializeOwned,
{
    fetch_json_while(client, url, max_attempts, retry_delay, || true).await
}

/// Like `fetch_json`, but gives up retrying once `wanted` returns false
///
/// `wanted` is checked before each backoff sleep and again before the next
/// request. The last attempt's outcome is returned when it stops early.
async fn fetch_json_while<T, W>(
    client: &Client,
    url: &str,
    max_attempts: u32,
    retry_delay: Duration,
    wanted: W,
) -> FetchOutcome<T>
where
    T: DeserializeOwned,
    W: Fn() -> bool,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        tracing::debug!("GET {} (attempt {}/{})", url, attempt, attempts);

        let last = match attempt_fetch(client, url, attempt).await {
            Attempt::Done(outcome) => return outcome,
            Attempt::Retry(outcome) => outcome,
        };

        if attempt >= attempts {
            return last;
        }
        if !wanted() {
            tracing::debug!("Dropping retries for {}: nobody is waiting", url);
            return last;
        }

        let delay = backoff_delay(retry_delay, attempt);
        tracing::warn!(
            "Fetch of {} did not succeed ({}), retrying in {:?}",
            url,
            last.status(),
            delay
        );
        tokio::time::sleep(delay).await;

        if !wanted() {
            tracing::debug!("Dropping retries for {}: nobody is waiting", url);
            return last;
        }
        attempt += 1;
    }
}

async fn attempt_fetch<T>(client: &Client, url: &str, attempt: u32) -> Attempt<T>
where
    T: DeserializeOwned,
{
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_transport_error(&e, attempt),
    };

    let status = response.status();
    if !status.is_success() {
        let failure = FetchFailure::new(
            Some(status.as_u16()),
            status.canonical_reason().unwrap_or("Unexpected status"),
        );
        return if is_retryable_status(status) {
            Attempt::Retry(FetchOutcome::Failed(failure))
        } else {
            Attempt::Done(FetchOutcome::Failed(failure))
        };
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return classify_transport_error(&e, attempt),
    };

    match serde_json::from_str::<T>(&body) {
        Ok(value) => Attempt::Done(FetchOutcome::Success(value)),
        Err(e) => Attempt::Done(FetchOutcome::Failed(FetchFailure::new(
            Some(status.as_u16()),
            format!("Invalid document: {}", e),
        ))),
    }
}

fn classify_transport_error<T>(error: &reqwest::Error, attempt: u32) -> Attempt<T> {
    if error.is_timeout() {
        Attempt::Retry(FetchOutcome::Timeout { attempts: attempt })
    } else if error.is_connect() {
        Attempt::Retry(FetchOutcome::Failed(FetchFailure::new(
            None,
            format!("Connection failed: {}", error),
        )))
    } else {
        Attempt::Done(FetchOutcome::Failed(FetchFailure::new(
            error.status().map(|s| s.as_u16()),
            error.to_string(),
        )))
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Exponential delay before retry number `attempt` (1-based)
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(8);
    base.saturating_mul(1u32 << exponent)
}
