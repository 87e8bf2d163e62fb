//! Sequential download of bookmarked languages

use crate::fetch::Fetcher;
use crate::language::{display_name, Language};
use crate::sync::progress::{ProgressSink, UPDATE_STAGE};
use crate::sync::UpdateSettings;
use crate::SyncError;

/// Overall progress after `completed` of `total` languages
///
/// The denominator counts the manifest as one extra step.
pub fn batch_fraction(completed: usize, total: usize) -> f64 {
    completed as f64 / (total + 1) as f64
}

/// Fetches every URL in order, one at a time
///
/// The first failure aborts the batch: later URLs are not requested and
/// the languages fetched so far are discarded.
pub async fn fetch_languages<F: Fetcher>(
    fetcher: &F,
    urls: &[String],
    settings: &UpdateSettings,
    sink: &dyn ProgressSink,
) -> Result<Vec<Language>, SyncError> {
    let total = urls.len();
    let mut languages = Vec::with_capacity(total);

    for (index, url) in urls.iter().enumerate() {
        let name = display_name(url);
        sink.progress(
            UPDATE_STAGE,
            &format!("Downloading {}", name),
            batch_fraction(index, total),
        );

        let outcome = fetcher
            .fetch::<Language>(url, settings.max_attempts)
            .wait(settings.poll_interval)
            .await;

        match outcome.into_result(url) {
            Ok(language) => {
                tracing::debug!(
                    "Fetched {} version {} ({}/{})",
                    language.name,
                    language.version,
                    index + 1,
                    total
                );
                languages.push(language);
                sink.progress(
                    UPDATE_STAGE,
                    &format!("Downloaded {}", name),
                    batch_fraction(index + 1, total),
                );
            }
            Err(e) => {
                tracing::error!(
                    "Aborting language download at {} ({}/{}): {}",
                    name,
                    index + 1,
                    total,
                    e
                );
                return Err(e);
            }
        }
    }

    Ok(languages)
}
