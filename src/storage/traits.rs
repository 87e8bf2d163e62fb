//! Storage traits and error types
//!
//! This module defines the trait interface for language stores and
//! associated error types.

use crate::language::Language;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Local store of installed language definitions
///
/// `upsert` may stage changes in memory; they only become durable once
/// `save` returns. `save` writes every staged change or none of them.
pub trait LanguageStore {
    /// Gets the installed language with the given name
    fn lookup(&self, name: &str) -> StoreResult<Option<Language>>;

    /// Inserts a language, replacing any entry with the same name
    fn upsert(&mut self, language: Language) -> StoreResult<()>;

    /// Persists all staged changes
    fn save(&mut self) -> StoreResult<()>;

    /// Lists every installed language, ordered by name
    fn languages(&self) -> StoreResult<Vec<Language>>;
}

impl<S: LanguageStore + ?Sized> LanguageStore for &mut S {
    fn lookup(&self, name: &str) -> StoreResult<Option<Language>> {
        (**self).lookup(name)
    }

    fn upsert(&mut self, language: Language) -> StoreResult<()> {
        (**self).upsert(language)
    }

    fn save(&mut self) -> StoreResult<()> {
        (**self).save()
    }

    fn languages(&self) -> StoreResult<Vec<Language>> {
        (**self).languages()
    }
}
