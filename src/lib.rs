//! Mutuals: a reciprocal-friend network sampler
//!
//! This crate samples the social-graph neighborhood of a seed account. It pages
//! through friend and follower lists on a rate-limited remote API, keeps the
//! accounts that follow each other, ranks them by popularity and expands the
//! most popular ones breadth-first until enough distinct accounts are known.

pub mod api;
pub mod config;
pub mod crawler;
pub mod graph;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

pub use crawler::RequestStep;

/// Main error type for Mutuals operations
#[derive(Debug, Error)]
pub enum MutualsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request failed during {step}: {source}")]
    Request {
        step: RequestStep,
        source: api::ApiError,
    },

    #[error("Gave up during {step} after {attempts} attempts: {source}")]
    RetriesExhausted {
        step: RequestStep,
        attempts: u32,
        source: api::ApiError,
    },

    #[error("Seed account not found: {seed}")]
    SeedNotFound { seed: String },

    #[error("Cancelled during {step}")]
    Cancelled { step: RequestStep },

    #[error("Crawl stalled after {passes} passes with {visited} of {target} accounts")]
    Stalled {
        passes: u32,
        visited: usize,
        target: usize,
    },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MutualsError {
    /// The request step that failed, if the error came from a remote call
    pub fn step(&self) -> Option<RequestStep> {
        match self {
            Self::Request { step, .. }
            | Self::RetriesExhausted { step, .. }
            | Self::Cancelled { step } => Some(*step),
            Self::SeedNotFound { .. } => Some(RequestStep::ResolveSeed),
            _ => None,
        }
    }
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
}

/// Result type alias for Mutuals operations
pub type Result<T> = std::result::Result<T, MutualsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlParams, NetworkCrawler};
pub use graph::{AccountId, AccountProfile, AccountRef, NetworkGraph};
pub use state::CrawlPhase;
