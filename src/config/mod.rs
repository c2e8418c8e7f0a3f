//! Configuration module for Mutuals
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use mutuals::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mutuals.toml")).unwrap();
//! println!("Crawl will stop at {} accounts", config.crawl.target_threshold);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, CrawlConfig, OutputConfig, RetryConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
