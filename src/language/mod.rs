//! Language documents and the bookmark manifest
//!
//! A language definition is a named, versioned JSON document. Only `name`
//! and `version` are interpreted here; every other field is carried along
//! untouched as the payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// The manifest listing every downloadable language document
///
/// Wire form: `{"bookmarks": ["https://.../French.json", ...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmarks {
    pub bookmarks: Vec<String>,
}

impl Bookmarks {
    pub fn new(bookmarks: Vec<String>) -> Self {
        Self { bookmarks }
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    pub fn urls(&self) -> &[String] {
        &self.bookmarks
    }
}

/// A language definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    /// Identity used to match against the local store
    pub name: String,

    pub version: u32,

    /// Remaining document fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Language {
    /// Creates a language with an empty payload
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            payload: Map::new(),
        }
    }

    /// Adds a payload field, replacing any previous value under that key
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Returns true if this language's version is strictly greater than `other`'s
    pub fn is_newer_than(&self, other: &Language) -> bool {
        self.version > other.version
    }
}

/// Derives a short display name from a document URL
///
/// Uses the last non-empty path segment with its extension removed, so
/// `https://host/langs/French.json` becomes `French`. Percent-escapes are
/// decoded (`Old%20English.json` is `Old English`). Falls back to the raw
/// string when no usable segment exists.
pub fn display_name(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|segment| match urlencoding::decode(segment) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => segment.to_string(),
            })
    });

    match segment {
        Some(segment) => {
            let stem = match segment.rfind('.') {
                Some(idx) if idx > 0 => &segment[..idx],
                _ => segment.as_str(),
            };
            stem.to_string()
        }
        None => url.to_string(),
    }
}
