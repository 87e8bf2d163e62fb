//! Scripted fetcher and recording sink for pipeline tests

use crate::fetch::{FetchFailure, FetchOperation, FetchOutcome, Fetcher};
use crate::sync::ProgressSink;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Canned reply for one URL
#[derive(Debug, Clone)]
pub enum Scripted {
    Json(Value),
    Failed(Option<u16>, String),
    Timeout(u32),
    /// Stays pending until `release_next` is called
    Hold,
}

#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<(String, u32)>>,
    held: Mutex<Vec<oneshot::Sender<Scripted>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, scripted: Scripted) -> Self {
        self.set(url, scripted);
        self
    }

    pub fn set(&self, url: &str, scripted: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), scripted);
    }

    /// URLs requested so far, in order
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn requested_attempts(&self) -> Vec<u32> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, attempts)| *attempts)
            .collect()
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Resolves the oldest held request with `scripted`
    pub fn release_next(&self, scripted: Scripted) {
        let sender = self.held.lock().unwrap().remove(0);
        sender.send(scripted).unwrap();
    }
}

fn outcome_from<T: DeserializeOwned>(scripted: Scripted) -> FetchOutcome<T> {
    match scripted {
        Scripted::Json(value) => match serde_json::from_value(value) {
            Ok(decoded) => FetchOutcome::Success(decoded),
            Err(e) => FetchOutcome::Failed(FetchFailure::new(Some(200), e.to_string())),
        },
        Scripted::Failed(code, message) => FetchOutcome::Failed(FetchFailure::new(code, message)),
        Scripted::Timeout(attempts) => FetchOutcome::Timeout { attempts },
        Scripted::Hold => FetchOutcome::Failed(FetchFailure::new(None, "held twice")),
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch<T>(&self, url: &str, max_attempts: u32) -> FetchOperation<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), max_attempts));

        let scripted = self.responses.lock().unwrap().get(url).cloned();
        match scripted {
            None => FetchOperation::resolved(
                url,
                FetchOutcome::Failed(FetchFailure::new(Some(404), "Not Found")),
            ),
            Some(Scripted::Hold) => {
                let (operation, completer) = FetchOperation::channel(url);
                let (sender, receiver) = oneshot::channel();
                self.held.lock().unwrap().push(sender);
                tokio::spawn(async move {
                    if let Ok(scripted) = receiver.await {
                        completer.complete(outcome_from::<T>(scripted));
                    }
                });
                operation
            }
            Some(scripted) => FetchOperation::resolved(url, outcome_from(scripted)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Progress(String, f64),
    Report(String),
    Error(String),
}

/// Sink that records everything it receives
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Progress(_, fraction) => Some(fraction),
                _ => None,
            })
            .collect()
    }

    pub fn details(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Progress(detail, _) => Some(detail),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn progress(&self, _stage: &str, detail: &str, fraction: f64) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Progress(detail.to_string(), fraction));
    }

    fn show_report(&self, _title: &str, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Report(message.to_string()));
    }

    fn show_error(&self, _title: &str, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Error(message.to_string()));
    }
}
