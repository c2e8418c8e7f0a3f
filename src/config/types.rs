use serde::Deserialize;

/// Main configuration structure for Mutuals
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// Remote API endpoint and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL the endpoint paths are joined onto
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// OAuth2 bearer token sent with every request
    #[serde(rename = "bearer-token")]
    pub bearer_token: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Client identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "client-name")]
    pub client_name: String,

    #[serde(rename = "client-version")]
    pub client_version: String,

    /// URL with information about the client
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

/// Retry/backoff policy for remote calls
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetryConfig {
    /// Wait before the first retry (seconds)
    #[serde(rename = "initial-wait-secs", default = "default_initial_wait")]
    pub initial_wait_secs: f64,

    /// Factor applied to the wait after each retry
    #[serde(rename = "backoff-multiplier", default = "default_multiplier")]
    pub backoff_multiplier: f64,

    /// Server-error backoff gives up once the wait exceeds this (seconds)
    #[serde(rename = "max-server-wait-secs", default = "default_max_server_wait")]
    pub max_server_wait_secs: f64,

    /// Consecutive transient faults tolerated before giving up
    #[serde(rename = "max-transient-errors", default = "default_max_transient")]
    pub max_transient_errors: u32,

    /// Sleep after a rate-limit response (seconds)
    #[serde(rename = "rate-limit-window-secs", default = "default_rate_limit_window")]
    pub rate_limit_window_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_wait_secs: default_initial_wait(),
            backoff_multiplier: default_multiplier(),
            max_server_wait_secs: default_max_server_wait(),
            max_transient_errors: default_max_transient(),
            rate_limit_window_secs: default_rate_limit_window(),
        }
    }
}

/// Crawl scope configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed account: a numeric id or a handle
    pub seed: String,

    /// Cap on each of the friend and follower lists fetched per account
    #[serde(rename = "per-node-limit", default = "default_per_node_limit")]
    pub per_node_limit: usize,

    /// Crawl stops once this many distinct accounts have been seen
    #[serde(rename = "target-threshold", default = "default_target_threshold")]
    pub target_threshold: usize,

    /// Neighbors kept per expanded account
    #[serde(rename = "top-k", default = "default_top_k")]
    pub top_k: usize,

    /// Optional hard cap on expansion passes
    #[serde(rename = "max-passes", default)]
    pub max_passes: Option<u32>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite checkpoint database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSON graph file
    #[serde(rename = "graph-path")]
    pub graph_path: String,

    /// Path to the network statistics report
    #[serde(rename = "stats-path", default = "default_stats_path")]
    pub stats_path: String,
}

fn default_base_url() -> String {
    "https://api.twitter.com/1.1/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_initial_wait() -> f64 {
    2.0
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_max_server_wait() -> f64 {
    3600.0
}

fn default_max_transient() -> u32 {
    10
}

fn default_rate_limit_window() -> f64 {
    // 15 minute window plus a small margin
    60.0 * 15.0 + 5.0
}

fn default_per_node_limit() -> usize {
    500
}

fn default_target_threshold() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

fn default_stats_path() -> String {
    "./network_info.txt".to_string()
}
