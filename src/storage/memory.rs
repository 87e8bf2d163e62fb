//! In-memory storage implementation
//!
//! Used by tests and by callers that persist languages some other way.

use crate::language::Language;
use crate::storage::traits::{LanguageStore, StoreResult};
use std::collections::BTreeMap;

/// In-memory implementation of LanguageStore
#[derive(Debug, Default, Clone)]
pub struct MemoryLanguageStore {
    languages: BTreeMap<String, Language>,
    save_count: usize,
}

impl MemoryLanguageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `languages`
    pub fn with_languages(languages: impl IntoIterator<Item = Language>) -> Self {
        Self {
            languages: languages
                .into_iter()
                .map(|language| (language.name.clone(), language))
                .collect(),
            save_count: 0,
        }
    }

    /// How many times `save` has been called
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl LanguageStore for MemoryLanguageStore {
    fn lookup(&self, name: &str) -> StoreResult<Option<Language>> {
        Ok(self.languages.get(name).cloned())
    }

    fn upsert(&mut self, language: Language) -> StoreResult<()> {
        self.languages.insert(language.name.clone(), language);
        Ok(())
    }

    fn save(&mut self) -> StoreResult<()> {
        self.save_count += 1;
        Ok(())
    }

    fn languages(&self) -> StoreResult<Vec<Language>> {
        Ok(self.languages.values().cloned().collect())
    }
}
