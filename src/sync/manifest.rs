//! Bookmark manifest fetching

use crate::fetch::Fetcher;
use crate::language::Bookmarks;
use crate::sync::UpdateSettings;
use crate::SyncError;

/// Fetches the bookmark manifest named in `settings`
///
/// A timeout or failure is returned as an error; a partial manifest is
/// never produced.
pub async fn fetch_bookmarks<F: Fetcher>(
    fetcher: &F,
    settings: &UpdateSettings,
) -> Result<Bookmarks, SyncError> {
    let url = settings.manifest_url.as_str();
    tracing::info!("Fetching bookmarks from {}", url);

    let bookmarks = fetcher
        .fetch::<Bookmarks>(url, settings.max_attempts)
        .wait(settings.poll_interval)
        .await
        .into_result(url)?;

    tracing::info!("Manifest lists {} language(s)", bookmarks.len());
    Ok(bookmarks)
}
