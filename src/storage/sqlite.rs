//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LanguageStore trait,
//! plus the update run history.

use crate::language::Language;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LanguageStore, StoreError, StoreResult};
use crate::storage::{RunCounts, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite language store
///
/// All installed languages are loaded at open. `upsert` only touches the
/// in-memory view; `save` writes the staged languages in one transaction.
pub struct SqliteLanguageStore {
    conn: Connection,
    languages: BTreeMap<String, Language>,
    staged: BTreeMap<String, Language>,
}

impl SqliteLanguageStore {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::from_connection(conn)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        initialize_schema(&conn)?;
        let languages = load_languages(&conn)?;
        tracing::debug!("Loaded {} installed languages", languages.len());

        Ok(Self {
            conn,
            languages,
            staged: BTreeMap::new(),
        })
    }

    /// Number of upserts waiting for `save`
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    // ===== Run History =====

    /// Records the start of an update run and returns its ID
    pub fn begin_run(&mut self, config_hash: &str) -> StoreResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO update_runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Marks a run as completed with its reconciliation counts
    pub fn complete_run(&mut self, run_id: i64, counts: RunCounts) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE update_runs SET status = ?1, finished_at = ?2, added = ?3, updated = ?4,
             unchanged = ?5 WHERE id = ?6",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                counts.added,
                counts.updated,
                counts.unchanged,
                run_id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::RunNotFound(run_id));
        }
        Ok(())
    }

    /// Marks a run as failed with the reason it aborted
    pub fn fail_run(&mut self, run_id: i64, error_message: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE update_runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![RunStatus::Failed.to_db_string(), now, error_message, run_id],
        )?;
        if changed == 0 {
            return Err(StoreError::RunNotFound(run_id));
        }
        Ok(())
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StoreResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, added, updated,
                 unchanged, error_message FROM update_runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StoreError::RunNotFound(run_id))?
    }

    /// Lists the most recent runs, newest first
    pub fn recent_runs(&self, limit: usize) -> StoreResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status, added, updated,
             unchanged, error_message FROM update_runs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().collect()
    }
}

impl LanguageStore for SqliteLanguageStore {
    fn lookup(&self, name: &str) -> StoreResult<Option<Language>> {
        Ok(self.languages.get(name).cloned())
    }

    fn upsert(&mut self, language: Language) -> StoreResult<()> {
        self.staged.insert(language.name.clone(), language.clone());
        self.languages.insert(language.name.clone(), language);
        Ok(())
    }

    fn save(&mut self) -> StoreResult<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO languages (name, version, payload, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO UPDATE SET version = excluded.version,
                 payload = excluded.payload, updated_at = excluded.updated_at",
            )?;

            for language in self.staged.values() {
                let payload = serde_json::to_string(&language.payload)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                stmt.execute(params![language.name, language.version, payload, now])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} language(s)", self.staged.len());
        self.staged.clear();
        Ok(())
    }

    fn languages(&self) -> StoreResult<Vec<Language>> {
        Ok(self.languages.values().cloned().collect())
    }
}

fn load_languages(conn: &Connection) -> StoreResult<BTreeMap<String, Language>> {
    let mut stmt = conn.prepare("SELECT name, version, payload FROM languages")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut languages = BTreeMap::new();
    for (name, version, payload) in rows {
        let payload: Map<String, Value> = serde_json::from_str(&payload).map_err(|e| {
            StoreError::Serialization(format!("Stored payload for {} is invalid: {}", name, e))
        })?;
        languages.insert(
            name.clone(),
            Language {
                name,
                version,
                payload,
            },
        );
    }

    Ok(languages)
}

/// Maps a row to a run record; an unknown status is reported as an inner error
fn run_from_row(row: &Row<'_>) -> rusqlite::Result<StoreResult<RunRecord>> {
    let status: String = row.get(4)?;
    let Some(status) = RunStatus::from_db_string(&status) else {
        return Ok(Err(StoreError::Database(format!(
            "Unknown run status '{}'",
            status
        ))));
    };

    Ok(Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status,
        counts: RunCounts {
            added: row.get(5)?,
            updated: row.get(6)?,
            unchanged: row.get(7)?,
        },
        error_message: row.get(8)?,
    }))
}
