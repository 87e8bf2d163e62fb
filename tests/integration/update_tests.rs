//! Integration tests for the update pipeline
//!
//! These tests use wiremock to serve a bookmark manifest and language
//! documents, and run full updates against a SQLite store on disk.

use lingua_sync::config::{Config, RemoteConfig, StoreConfig, UserAgentConfig};
use lingua_sync::fetch::{build_http_client, Fetcher};
use lingua_sync::storage::{open_storage, LanguageStore, RunStatus, SqliteLanguageStore};
use lingua_sync::sync::{run_recorded_update, run_update, NoProgress, UpdateSettings, Updater};
use lingua_sync::{HttpFetcher, SyncError, UP_TO_DATE_MESSAGE};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        remote: RemoteConfig {
            manifest_url: format!("{}/bookmarks.json", base_url),
            max_attempts: 3,
            request_timeout_secs: 5,
            retry_delay_ms: 10, // Very short for testing
            poll_interval_ms: 5,
            https_only: false,
        },
        user_agent: UserAgentConfig {
            name: "TestSync".to_string(),
            version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        store: StoreConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        },
    }
}

/// Mounts a manifest listing `names` and one document per language
async fn mount_languages(server: &MockServer, languages: &[(&str, u32)]) {
    let urls: Vec<String> = languages
        .iter()
        .map(|(name, _)| format!("{}/langs/{}.json", server.uri(), name))
        .collect();

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bookmarks": urls })))
        .mount(server)
        .await;

    for (name, version) in languages {
        Mock::given(method("GET"))
            .and(path(format!("/langs/{}.json", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": name,
                "version": version,
                "extension": name.to_lowercase(),
            })))
            .mount(server)
            .await;
    }
}

fn open_store(dir: &TempDir) -> SqliteLanguageStore {
    open_storage(&dir.path().join("languages.db")).expect("Failed to open store")
}

#[tokio::test]
async fn test_full_update_populates_store() {
    let server = MockServer::start().await;
    mount_languages(&server, &[("French", 1), ("German", 2)]).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));

    let mut store = open_store(&dir);
    let report = run_update(&config, &mut store, &NoProgress)
        .await
        .expect("Update should succeed");

    assert_eq!(report.message(), "Added French.\nAdded German.");

    // A fresh connection sees the saved languages
    drop(store);
    let reopened = open_store(&dir);
    let french = reopened.lookup("French").unwrap().expect("French saved");
    assert_eq!(french.version, 1);
    assert_eq!(french.payload.get("extension"), Some(&json!("french")));
    assert_eq!(reopened.lookup("German").unwrap().unwrap().version, 2);
}

#[tokio::test]
async fn test_rerun_reports_up_to_date() {
    let server = MockServer::start().await;
    mount_languages(&server, &[("French", 1), ("German", 2)]).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    run_update(&config, &mut store, &NoProgress).await.unwrap();
    let second = run_update(&config, &mut store, &NoProgress).await.unwrap();

    assert_eq!(second.message(), UP_TO_DATE_MESSAGE);
    assert_eq!(second.unchanged_count(), 2);
}

#[tokio::test]
async fn test_newer_remote_version_is_reported_as_update() {
    let server = MockServer::start().await;
    mount_languages(&server, &[("French", 1), ("German", 3)]).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);
    store
        .upsert(lingua_sync::Language::new("German", 2))
        .unwrap();
    store.save().unwrap();

    let report = run_update(&config, &mut store, &NoProgress).await.unwrap();

    assert_eq!(
        report.message(),
        "Added French.\n\nUpdated German from version 2 to 3"
    );
    assert_eq!(store.lookup("German").unwrap().unwrap().version, 3);
}

#[tokio::test]
async fn test_missing_language_aborts_without_changes() {
    let server = MockServer::start().await;
    let urls = vec![
        format!("{}/langs/French.json", server.uri()),
        format!("{}/langs/Missing.json", server.uri()),
        format!("{}/langs/German.json", server.uri()),
    ];

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bookmarks": urls })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/langs/French.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": "French", "version": 1 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/langs/Missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/langs/German.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": "German", "version": 1 })),
        )
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let result = run_update(&config, &mut store, &NoProgress).await;

    match result {
        Err(SyncError::FetchFailed {
            url, status_code, ..
        }) => {
            assert_eq!(url, urls[1]);
            assert_eq!(status_code, Some(404));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(store.languages().unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_is_retried_up_to_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let result = run_update(&config, &mut store, &NoProgress).await;

    assert!(matches!(
        result,
        Err(SyncError::FetchFailed {
            status_code: Some(503),
            ..
        })
    ));
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let server = MockServer::start().await;
    mount_languages(&server, &[("French", 1)]).await;

    // Takes priority over the healthy mock until it has answered once
    Mock::given(method("GET"))
        .and(path("/langs/French.json"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let report = run_update(&config, &mut store, &NoProgress).await.unwrap();
    assert_eq!(report.message(), "Added French.");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let result = run_update(&config, &mut store, &NoProgress).await;
    assert!(matches!(
        result,
        Err(SyncError::FetchFailed {
            status_code: Some(403),
            ..
        })
    ));
}

#[tokio::test]
async fn test_undecodable_manifest_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let result = run_update(&config, &mut store, &NoProgress).await;

    match result {
        Err(SyncError::FetchFailed { message, .. }) => {
            assert!(message.starts_with("Invalid document"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_manifest_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "bookmarks": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    config.remote.request_timeout_secs = 1;
    config.remote.max_attempts = 2;
    let mut store = open_store(&dir);

    let result = run_update(&config, &mut store, &NoProgress).await;

    assert!(matches!(
        result,
        Err(SyncError::Timeout { attempts: 2, .. })
    ));
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .and(header(
            "user-agent",
            "TestSync/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bookmarks": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let report = run_update(&config, &mut store, &NoProgress).await.unwrap();
    assert_eq!(report.message(), UP_TO_DATE_MESSAGE);
}

#[tokio::test]
async fn test_run_history_is_recorded() {
    let server = MockServer::start().await;
    mount_languages(&server, &[("French", 1), ("German", 2)]).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let run_id = store.begin_run("test-hash").unwrap();
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.remote).unwrap();
    let updater = Updater::new(
        fetcher,
        &mut store,
        UpdateSettings::from_config(&config.remote),
    );
    let report = updater.run(&NoProgress).await.unwrap();
    drop(updater);
    store.complete_run(run_id, report.counts()).unwrap();

    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.counts.added, 2);
    assert_eq!(run.counts.updated, 0);
    assert!(run.finished_at.is_some());
    assert_eq!(store.recent_runs(5).unwrap().len(), 1);
}

#[tokio::test]
async fn test_plain_http_rejected_when_https_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bookmarks": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    config.remote.https_only = true;
    let mut store = open_store(&dir);

    let result = run_update(&config, &mut store, &NoProgress).await;
    assert!(matches!(result, Err(SyncError::FetchFailed { .. })));
}

#[tokio::test]
async fn test_dropped_fetch_stops_retrying() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/langs/French.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let client = build_http_client(&config.user_agent, &config.remote).unwrap();
    let fetcher = HttpFetcher::new(client, Duration::from_millis(50));

    let operation =
        fetcher.fetch::<serde_json::Value>(&format!("{}/langs/French.json", server.uri()), 5);

    // Wait for the first request, then walk away from the handle
    loop {
        let seen = server.received_requests().await.unwrap_or_default().len();
        if seen > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    drop(operation);

    // Enough time for the full backoff schedule (50 + 100 + 200 + 400 ms)
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let requests = server.received_requests().await.unwrap_or_default().len();
    assert!(
        requests <= 2,
        "expected retries to stop once the handle was dropped, saw {} requests",
        requests
    );
}

#[tokio::test]
async fn test_held_fetch_uses_full_attempt_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/langs/French.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let client = build_http_client(&config.user_agent, &config.remote).unwrap();
    let fetcher = HttpFetcher::new(client, Duration::from_millis(5));

    let outcome = fetcher
        .fetch::<serde_json::Value>(&format!("{}/langs/French.json", server.uri()), 4)
        .wait(Duration::from_millis(5))
        .await;

    assert!(matches!(
        outcome.into_result("French"),
        Err(SyncError::FetchFailed {
            status_code: Some(503),
            ..
        })
    ));
}

#[tokio::test]
async fn test_recorded_update_marks_run_completed() {
    let server = MockServer::start().await;
    mount_languages(&server, &[("French", 1)]).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let report = run_recorded_update(&config, "hash-a", &mut store, &NoProgress)
        .await
        .unwrap();
    assert_eq!(report.message(), "Added French.");

    let runs = store.recent_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].config_hash, "hash-a");
    assert_eq!(runs[0].counts.added, 1);
    assert!(runs[0].error_message.is_none());
}

#[tokio::test]
async fn test_recorded_update_marks_run_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookmarks.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), &dir.path().join("languages.db"));
    let mut store = open_store(&dir);

    let result = run_recorded_update(&config, "hash-b", &mut store, &NoProgress).await;
    assert!(matches!(
        result,
        Err(SyncError::FetchFailed {
            status_code: Some(404),
            ..
        })
    ));

    // No run is left dangling in the `running` state
    let runs = store.recent_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert!(runs[0].finished_at.is_some());
    assert!(runs[0]
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("HTTP 404"));
}
