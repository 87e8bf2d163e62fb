//! Storage module for persisting language definitions
//!
//! This module handles:
//! - The `LanguageStore` trait consumed by the reconciler
//! - SQLite and in-memory store implementations
//! - Update run tracking

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryLanguageStore;
pub use sqlite::SqliteLanguageStore;
pub use traits::{LanguageStore, StoreError, StoreResult};

use std::path::Path;

/// Opens the SQLite language store at `path`
pub fn open_storage(path: &Path) -> StoreResult<SqliteLanguageStore> {
    SqliteLanguageStore::new(path)
}

/// Represents an update run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counts: RunCounts,
    pub error_message: Option<String>,
}

/// How many languages a run added, updated or left alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub added: u32,
    pub updated: u32,
    pub unchanged: u32,
}

/// Status of an update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
