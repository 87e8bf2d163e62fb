//! Merging downloaded languages into the local store

use crate::language::Language;
use crate::storage::{LanguageStore, StoreResult};

/// How a downloaded language compared to the installed one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing with this name was installed
    Added { version: u32 },

    /// An older version was installed and has been replaced
    Updated { previous: u32, current: u32 },

    /// Installed version is the same or newer; `version` is the installed one
    Unchanged { version: u32 },
}

impl ReconcileOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }
}

/// Result of merging one downloaded language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub name: String,
    pub outcome: ReconcileOutcome,
}

impl Reconciliation {
    pub fn new(name: impl Into<String>, outcome: ReconcileOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }
}

/// Classifies `fetched` against the installed language, if any
///
/// Only versions are compared. Payload differences at an equal version
/// leave the language unchanged.
pub fn classify(installed: Option<&Language>, fetched: &Language) -> ReconcileOutcome {
    match installed {
        None => ReconcileOutcome::Added {
            version: fetched.version,
        },
        Some(installed) if fetched.is_newer_than(installed) => ReconcileOutcome::Updated {
            previous: installed.version,
            current: fetched.version,
        },
        Some(installed) => ReconcileOutcome::Unchanged {
            version: installed.version,
        },
    }
}

/// Merges `fetched` into `store`, in order, and saves once
///
/// Returns one record per input language in the same order. Added and
/// updated languages are upserted; unchanged ones are left alone. `save` is
/// called exactly once, after every record has been computed.
pub fn reconcile<S: LanguageStore + ?Sized>(
    store: &mut S,
    fetched: Vec<Language>,
) -> StoreResult<Vec<Reconciliation>> {
    let mut records = Vec::with_capacity(fetched.len());

    for language in fetched {
        let installed = store.lookup(&language.name)?;
        let outcome = classify(installed.as_ref(), &language);

        match outcome {
            ReconcileOutcome::Added { version } => {
                tracing::info!("Adding {} (version {})", language.name, version);
            }
            ReconcileOutcome::Updated { previous, current } => {
                tracing::info!(
                    "Updating {} from version {} to {}",
                    language.name,
                    previous,
                    current
                );
            }
            ReconcileOutcome::Unchanged { version } => {
                tracing::debug!("{} already at version {}", language.name, version);
            }
        }

        let record = Reconciliation::new(language.name.clone(), outcome);
        if outcome.is_change() {
            store.upsert(language)?;
        }
        records.push(record);
    }

    store.save()?;
    Ok(records)
}
