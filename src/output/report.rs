//! Reconciliation report formatting
//!
//! Turns reconciliation records into the message shown once an update
//! finishes. Added languages come first, then updated ones; each non-empty
//! group is separated from the next by a blank line. Unchanged languages are
//! tracked on the report but left out of the message.

use crate::storage::RunCounts;
use crate::sync::{ReconcileOutcome, Reconciliation};
use std::fmt;

/// Message shown when nothing was added or updated
pub const UP_TO_DATE_MESSAGE: &str = "All languages are up to date.";

/// Summary of one update run, grouped by outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    added: Vec<String>,
    updated: Vec<String>,
    unchanged: Vec<String>,
}

impl UpdateReport {
    /// Builds the report, keeping record order within each group
    pub fn from_records(records: &[Reconciliation]) -> Self {
        let mut report = Self::default();

        for record in records {
            match record.outcome {
                ReconcileOutcome::Added { .. } => {
                    report.added.push(format!("Added {}.", record.name));
                }
                ReconcileOutcome::Updated { previous, current } => {
                    report.updated.push(format!(
                        "Updated {} from version {} to {}",
                        record.name, previous, current
                    ));
                }
                ReconcileOutcome::Unchanged { version } => {
                    report.unchanged.push(format!(
                        "{} is already at version {}.",
                        record.name, version
                    ));
                }
            }
        }

        report
    }

    pub fn added_lines(&self) -> &[String] {
        &self.added
    }

    pub fn updated_lines(&self) -> &[String] {
        &self.updated
    }

    /// Lines for unchanged languages; never part of `message()`
    pub fn unchanged_lines(&self) -> &[String] {
        &self.unchanged
    }

    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    pub fn unchanged_count(&self) -> usize {
        self.unchanged.len()
    }

    /// Returns true if any language was added or updated
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty()
    }

    pub fn counts(&self) -> RunCounts {
        RunCounts {
            added: saturating_u32(self.added.len()),
            updated: saturating_u32(self.updated.len()),
            unchanged: saturating_u32(self.unchanged.len()),
        }
    }

    /// The user-facing message
    pub fn message(&self) -> String {
        let groups: Vec<String> = [&self.added, &self.updated]
            .into_iter()
            .filter(|group| !group.is_empty())
            .map(|group| group.join("\n"))
            .collect();

        if groups.is_empty() {
            UP_TO_DATE_MESSAGE.to_string()
        } else {
            groups.join("\n\n")
        }
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Formats reconciliation records as the update message
pub fn format_report(records: &[Reconciliation]) -> String {
    UpdateReport::from_records(records).message()
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
