//! Output module for update reports and store listings
//!
//! This module handles:
//! - Formatting reconciliation records into the update report
//! - Listing installed languages and update history for the CLI

mod listing;
mod report;

pub use listing::{format_language_list, format_run_history, print_history, print_languages};
pub use report::{format_report, UpdateReport, UP_TO_DATE_MESSAGE};
