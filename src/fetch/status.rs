/// Status definitions for fetch operations
use std::fmt;

/// Represents the current status of a fetch operation
///
/// A fetch starts `Pending` and moves exactly once to one of the terminal
/// statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// Request (or one of its retries) is still in flight
    Pending,

    /// Document was fetched and decoded
    Success,

    /// Request finished with a failure code and message
    Failed,

    /// Every attempt exceeded the request timeout
    Timeout,
}

impl FetchStatus {
    /// Returns true once the operation can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true for `Failed` and `Timeout`
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
