//! Corpus-Harvest: a resumable web harvester for offline corpus building
//!
//! This crate fetches seed pages through a JavaScript-capable render stage,
//! falls back to plain HTTP when that stage fails, filters URLs against a scope
//! policy, and persists every fetched page or file next to a JSON sidecar.

pub mod config;
pub mod crawler;
pub mod output;
pub mod page;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Corpus-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Render stage error: {0}")]
    Render(#[from] crawler::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, RenderEngine};
pub use output::RunSummary;
pub use page::Page;
pub use state::FetchStage;
pub use url::{extract_domain, ScopePolicy};
