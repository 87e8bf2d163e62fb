//! Progress reporting for update runs
//!
//! The update pipeline never renders anything itself. It reports stage
//! changes and the final outcome to a `ProgressSink` supplied by the caller.

/// Stage label used for every progress update of a run
pub const UPDATE_STAGE: &str = "Updating languages";

/// Dialog title when a run completes
pub const REPORT_TITLE: &str = "Language update complete";

/// Dialog title when a run aborts
pub const ERROR_TITLE: &str = "Language update failed";

/// Receives progress and the final outcome of an update run
pub trait ProgressSink: Send + Sync {
    /// Reports progress; `fraction` is in `0.0..=1.0` and never decreases
    /// within a run
    fn progress(&self, stage: &str, detail: &str, fraction: f64);

    /// Shows the formatted report of a finished run
    fn show_report(&self, title: &str, message: &str);

    /// Shows why a run was aborted
    fn show_error(&self, title: &str, message: &str);
}

/// Sink that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn progress(&self, stage: &str, detail: &str, fraction: f64) {
        tracing::info!("{}: {} ({:.0}%)", stage, detail, fraction * 100.0);
    }

    fn show_report(&self, title: &str, message: &str) {
        tracing::info!("{}", title);
        for line in message.lines().filter(|line| !line.is_empty()) {
            tracing::info!("  {}", line);
        }
    }

    fn show_error(&self, title: &str, message: &str) {
        tracing::error!("{}: {}", title, message);
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&self, _stage: &str, _detail: &str, _fraction: f64) {}

    fn show_report(&self, _title: &str, _message: &str) {}

    fn show_error(&self, _title: &str, _message: &str) {}
}
