//! Configuration module for Lingua-Sync
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use lingua_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lingua-sync.toml")).unwrap();
//! println!("Languages come from: {}", config.remote.manifest_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, RemoteConfig, StoreConfig, UserAgentConfig, DEFAULT_MANIFEST_URL};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
