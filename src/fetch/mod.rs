//! Fetch module for retrieving remote JSON documents
//!
//! This module contains:
//! - The `Fetcher` capability used by the update pipeline
//! - `FetchOperation`, a poll-able handle for one request
//! - The reqwest-backed `HttpFetcher` with retry logic

mod client;
mod operation;
mod status;

pub use client::{build_http_client, fetch_json, HttpFetcher};
pub use operation::{FetchCompleter, FetchFailure, FetchOperation, FetchOutcome};
pub use status::FetchStatus;

use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Capability to fetch and decode a remote document
///
/// Implementations retry internally up to `max_attempts` and resolve the
/// returned operation exactly once with the final outcome.
pub trait Fetcher {
    fn fetch<T>(&self, url: &str, max_attempts: u32) -> FetchOperation<T>
    where
        T: DeserializeOwned + Send + 'static;
}

impl<F: Fetcher> Fetcher for &F {
    fn fetch<T>(&self, url: &str, max_attempts: u32) -> FetchOperation<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        (**self).fetch(url, max_attempts)
    }
}

impl<F: Fetcher> Fetcher for Arc<F> {
    fn fetch<T>(&self, url: &str, max_attempts: u32) -> FetchOperation<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        (**self).fetch(url, max_attempts)
    }
}
