//! Update pipeline
//!
//! This module contains the language update machinery:
//! - Manifest fetching
//! - Sequential language downloads with progress
//! - Reconciliation against the local store
//! - The `Updater` that ties a run together and guards against overlap

mod batch;
mod coordinator;
mod manifest;
mod progress;
mod reconcile;
mod state;

#[cfg(test)]
mod testing;

pub use batch::{batch_fraction, fetch_languages};
pub use coordinator::{run_recorded_update, run_update, UpdateSettings, Updater};
pub use manifest::fetch_bookmarks;
pub use progress::{
    NoProgress, ProgressSink, TracingProgress, ERROR_TITLE, REPORT_TITLE, UPDATE_STAGE,
};
pub use reconcile::{classify, reconcile, ReconcileOutcome, Reconciliation};
pub use state::UpdateState;
