//! Update coordinator - drives one language update run
//!
//! A run moves through:
//! - fetching the bookmark manifest
//! - fetching every bookmarked language, in manifest order
//! - reconciling the languages against the local store
//! - formatting the report
//!
//! Any fetch failure aborts the run before reconciliation.

use crate::config::{Config, RemoteConfig};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::output::UpdateReport;
use crate::storage::{LanguageStore, SqliteLanguageStore};
use crate::sync::batch::{batch_fraction, fetch_languages};
use crate::sync::manifest::fetch_bookmarks;
use crate::sync::progress::{ProgressSink, ERROR_TITLE, REPORT_TITLE, UPDATE_STAGE};
use crate::sync::reconcile::reconcile;
use crate::sync::UpdateState;
use crate::SyncError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Where to fetch from and how hard to try
#[derive(Debug, Clone)]
pub struct UpdateSettings {
    pub manifest_url: String,

    /// Attempt budget for the manifest and for each language
    pub max_attempts: u32,

    /// Delay between checks of a pending fetch
    pub poll_interval: Duration,
}

impl UpdateSettings {
    pub fn from_config(remote: &RemoteConfig) -> Self {
        Self {
            manifest_url: remote.manifest_url.clone(),
            max_attempts: remote.max_attempts,
            poll_interval: remote.poll_interval(),
        }
    }
}

/// Drives update runs against one store
///
/// Only one run may be in flight at a time; `run` rejects a second call
/// with `SyncError::AlreadyRunning` while the first is active.
pub struct Updater<F, S> {
    fetcher: F,
    store: Mutex<S>,
    settings: UpdateSettings,
    busy: AtomicBool,
    state: Mutex<UpdateState>,
}

impl<F: Fetcher, S: LanguageStore> Updater<F, S> {
    pub fn new(fetcher: F, store: S, settings: UpdateSettings) -> Self {
        Self {
            fetcher,
            store: Mutex::new(store),
            settings,
            busy: AtomicBool::new(false),
            state: Mutex::new(UpdateState::Idle),
        }
    }

    /// True unless a run is in flight
    pub fn is_done_updating(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    pub fn state(&self) -> UpdateState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &UpdateSettings {
        &self.settings
    }

    /// Runs `f` with exclusive access to the store
    pub fn with_store<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock_store())
    }

    pub fn into_store(self) -> S {
        self.store
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one update and delivers the outcome to `sink`
    ///
    /// The busy flag is cleared before the final report or error is shown.
    pub async fn run(&self, sink: &dyn ProgressSink) -> Result<UpdateReport, SyncError> {
        let guard = self.claim()?;
        tracing::info!("Starting language update from {}", self.settings.manifest_url);

        let result = self.run_pipeline(&guard, sink).await;
        drop(guard);

        match &result {
            Ok(report) => {
                tracing::info!(
                    "Language update finished: {} added, {} updated, {} unchanged",
                    report.added_count(),
                    report.updated_count(),
                    report.unchanged_count()
                );
                sink.show_report(REPORT_TITLE, &report.message());
            }
            Err(e) => {
                tracing::error!("Language update failed: {}", e);
                sink.show_error(ERROR_TITLE, &e.to_string());
            }
        }

        result
    }

    async fn run_pipeline(
        &self,
        guard: &RunGuard<'_>,
        sink: &dyn ProgressSink,
    ) -> Result<UpdateReport, SyncError> {
        sink.progress(UPDATE_STAGE, "Downloading bookmarks", 0.0);
        let bookmarks = fetch_bookmarks(&self.fetcher, &self.settings).await?;

        guard.transition(UpdateState::FetchingLanguages);
        let languages =
            fetch_languages(&self.fetcher, bookmarks.urls(), &self.settings, sink).await?;

        guard.transition(UpdateState::Reconciling);
        sink.progress(
            UPDATE_STAGE,
            "Merging languages",
            batch_fraction(bookmarks.len(), bookmarks.len()),
        );
        let records = {
            let mut store = self.lock_store();
            reconcile(&mut *store, languages)?
        };

        let report = UpdateReport::from_records(&records);
        sink.progress(UPDATE_STAGE, "Done", 1.0);
        Ok(report)
    }

    /// Claims the busy flag, or fails if a run is already active
    fn claim(&self) -> Result<RunGuard<'_>, SyncError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Ignoring update request: an update is already running");
            return Err(SyncError::AlreadyRunning);
        }

        let guard = RunGuard {
            busy: &self.busy,
            state: &self.state,
        };
        guard.transition(UpdateState::FetchingManifest);
        Ok(guard)
    }

    fn lock_store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the busy flag for one run; returns to `Idle` when dropped
struct RunGuard<'a> {
    busy: &'a AtomicBool,
    state: &'a Mutex<UpdateState>,
}

impl RunGuard<'_> {
    fn transition(&self, next: UpdateState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(
            state.can_transition_to(next),
            "illegal update transition {} -> {}",
            *state,
            next
        );
        tracing::debug!("Update state: {} -> {}", *state, next);
        *state = next;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.transition(UpdateState::Idle);
        self.busy.store(false, Ordering::Release);
    }
}

/// Runs a single update against `store` using an HTTP fetcher built from `config`
///
/// # Example
///
/// ```no_run
/// use lingua_sync::config::load_config;
/// use lingua_sync::storage::open_storage;
/// use lingua_sync::sync::{run_update, TracingProgress};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("lingua-sync.toml"))?;
/// let mut store = open_storage(Path::new(&config.store.database_path))?;
/// let report = run_update(&config, &mut store, &TracingProgress).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub async fn run_update<S: LanguageStore>(
    config: &Config,
    store: S,
    sink: &dyn ProgressSink,
) -> Result<UpdateReport, SyncError> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.remote)?;
    let updater = Updater::new(fetcher, store, UpdateSettings::from_config(&config.remote));
    updater.run(sink).await
}

/// Runs a single update and records it in the store's run history
///
/// The HTTP client is built before the run row is created, so a
/// configuration the client rejects leaves no dangling `running` entry.
/// A failed run is recorded as `failed` with the error text.
pub async fn run_recorded_update(
    config: &Config,
    config_hash: &str,
    store: &mut SqliteLanguageStore,
    sink: &dyn ProgressSink,
) -> Result<UpdateReport, SyncError> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.remote)?;
    let run_id = store.begin_run(config_hash)?;
    tracing::debug!("Recorded update run #{}", run_id);

    let result = {
        let updater = Updater::new(
            fetcher,
            &mut *store,
            UpdateSettings::from_config(&config.remote),
        );
        updater.run(sink).await
    };

    match result {
        Ok(report) => {
            store.complete_run(run_id, report.counts())?;
            Ok(report)
        }
        Err(e) => {
            if let Err(record_err) = store.fail_run(run_id, &e.to_string()) {
                tracing::error!("Could not record failed run #{}: {}", run_id, record_err);
            }
            Err(e)
        }
    }
}
