//! Poll-able handle for a single fetch
//!
//! A `FetchOperation` is owned by whoever issued the fetch. The producing side
//! (normally a spawned HTTP task) holds the matching `FetchCompleter` and
//! resolves it exactly once.

use crate::fetch::FetchStatus;
use crate::SyncError;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Failure details carried by a `Failed` outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// HTTP status code, when the server answered
    pub status_code: Option<u16>,
    pub message: String,
}

impl FetchFailure {
    pub fn new(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    fn abandoned() -> Self {
        Self::new(None, "fetch task ended without a result")
    }
}

/// Terminal result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Success(T),
    Failed(FetchFailure),
    Timeout { attempts: u32 },
}

impl<T> FetchOutcome<T> {
    pub fn status(&self) -> FetchStatus {
        match self {
            Self::Success(_) => FetchStatus::Success,
            Self::Failed(_) => FetchStatus::Failed,
            Self::Timeout { .. } => FetchStatus::Timeout,
        }
    }

    /// Converts the outcome into the crate error type, naming `url` on failure
    pub fn into_result(self, url: &str) -> Result<T, SyncError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failed(failure) => Err(SyncError::FetchFailed {
                url: url.to_string(),
                status_code: failure.status_code,
                message: failure.message,
            }),
            Self::Timeout { attempts } => Err(SyncError::Timeout {
                url: url.to_string(),
                attempts,
            }),
        }
    }
}

/// Handle to an in-flight or completed fetch
pub struct FetchOperation<T> {
    url: String,
    status: FetchStatus,
    receiver: Option<oneshot::Receiver<FetchOutcome<T>>>,
    outcome: Option<FetchOutcome<T>>,
}

impl<T> FetchOperation<T> {
    /// Creates a pending operation and the completer that will resolve it
    pub fn channel(url: impl Into<String>) -> (Self, FetchCompleter<T>) {
        let (sender, receiver) = oneshot::channel();
        let operation = Self {
            url: url.into(),
            status: FetchStatus::Pending,
            receiver: Some(receiver),
            outcome: None,
        };
        (operation, FetchCompleter { sender })
    }

    /// Creates an operation that is already terminal
    pub fn resolved(url: impl Into<String>, outcome: FetchOutcome<T>) -> Self {
        Self {
            url: url.into(),
            status: outcome.status(),
            receiver: None,
            outcome: Some(outcome),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last observed status, without checking for progress
    pub fn status(&self) -> FetchStatus {
        self.status
    }

    /// Non-blocking check for a result
    ///
    /// If the producer went away without resolving the operation, it becomes
    /// `Failed`.
    pub fn poll(&mut self) -> FetchStatus {
        if let Some(receiver) = self.receiver.as_mut() {
            let outcome = match receiver.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return self.status,
                Err(TryRecvError::Closed) => FetchOutcome::Failed(FetchFailure::abandoned()),
            };
            self.receiver = None;
            self.status = outcome.status();
            self.outcome = Some(outcome);
        }
        self.status
    }

    /// Polls and, if terminal, takes the outcome out of the handle
    ///
    /// Returns `None` while pending and after the outcome was already taken.
    pub fn try_take(&mut self) -> Option<FetchOutcome<T>> {
        self.poll();
        self.outcome.take()
    }

    /// Suspends until the operation is terminal, checking once per `tick`
    pub async fn wait(mut self, tick: Duration) -> FetchOutcome<T> {
        loop {
            if let Some(outcome) = self.try_take() {
                return outcome;
            }
            if self.status.is_terminal() {
                // Outcome was taken earlier by the owner.
                return FetchOutcome::Failed(FetchFailure::abandoned());
            }
            tokio::time::sleep(tick).await;
        }
    }
}

/// Producer side of a `FetchOperation`
pub struct FetchCompleter<T> {
    sender: oneshot::Sender<FetchOutcome<T>>,
}

impl<T> FetchCompleter<T> {
    /// Resolves the operation. Ignored if the handle was dropped.
    pub fn complete(self, outcome: FetchOutcome<T>) {
        let _ = self.sender.send(outcome);
    }

    /// Returns true if the handle has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}
