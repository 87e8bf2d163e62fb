//! Plain-text listings of the local store for the CLI

use crate::language::Language;
use crate::storage::RunRecord;

/// Formats installed languages as `name  vN` lines, aligned on the name column
pub fn format_language_list(languages: &[Language]) -> String {
    if languages.is_empty() {
        return "No languages installed.".to_string();
    }

    let width = languages.iter().map(|l| l.name.len()).max().unwrap_or(0);
    let mut out = format!("Installed languages ({}):\n", languages.len());
    for language in languages {
        out.push_str(&format!(
            "  {:<width$}  v{}\n",
            language.name,
            language.version,
            width = width
        ));
    }
    out
}

/// Formats update run history, one run per line
pub fn format_run_history(runs: &[RunRecord]) -> String {
    if runs.is_empty() {
        return "No update runs recorded.".to_string();
    }

    let mut out = String::from("Recent update runs:\n");
    for run in runs {
        out.push_str(&format!(
            "  #{} {} [{}]",
            run.id,
            run.started_at,
            run.status.to_db_string()
        ));
        match &run.error_message {
            Some(message) => out.push_str(&format!(" {}", message)),
            None => out.push_str(&format!(
                " added {}, updated {}, unchanged {}",
                run.counts.added, run.counts.updated, run.counts.unchanged
            )),
        }
        out.push('\n');
    }
    out
}

/// Prints installed languages to stdout
pub fn print_languages(languages: &[Language]) {
    print!("{}", format_language_list(languages));
}

/// Prints update run history to stdout
pub fn print_history(runs: &[RunRecord]) {
    print!("{}", format_run_history(runs));
}
