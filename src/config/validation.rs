use crate::config::types::{
    ApiConfig, Config, CrawlConfig, OutputConfig, RetryConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_retry_config(&config.retry)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the API endpoint and credentials
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.bearer_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "bearer_token cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates client identification
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.client_name.is_empty() {
        return Err(ConfigError::Validation(
            "client_name cannot be empty".to_string(),
        ));
    }

    if !config
        .client_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "client_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.client_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if !(config.initial_wait_secs > 0.0) {
        return Err(ConfigError::Validation(format!(
            "initial_wait_secs must be > 0, got {}",
            config.initial_wait_secs
        )));
    }

    if !(config.backoff_multiplier > 1.0) {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be > 1, got {}",
            config.backoff_multiplier
        )));
    }

    if config.max_server_wait_secs < config.initial_wait_secs {
        return Err(ConfigError::Validation(format!(
            "max_server_wait_secs ({}) must be >= initial_wait_secs ({})",
            config.max_server_wait_secs, config.initial_wait_secs
        )));
    }

    if !(config.rate_limit_window_secs >= 0.0) {
        return Err(ConfigError::Validation(format!(
            "rate_limit_window_secs must be >= 0, got {}",
            config.rate_limit_window_secs
        )));
    }

    Ok(())
}

/// Validates crawl scope
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let seed = config.seed.trim().trim_start_matches('@');
    if seed.is_empty() {
        return Err(ConfigError::Validation("seed cannot be empty".to_string()));
    }

    if config.per_node_limit < 1 {
        return Err(ConfigError::Validation(
            "per_node_limit must be >= 1".to_string(),
        ));
    }

    if config.target_threshold < 1 {
        return Err(ConfigError::Validation(
            "target_threshold must be >= 1".to_string(),
        ));
    }

    if config.top_k < 1 {
        return Err(ConfigError::Validation("top_k must be >= 1".to_string()));
    }

    if config.max_passes == Some(0) {
        return Err(ConfigError::Validation(
            "max_passes must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.graph_path.is_empty() {
        return Err(ConfigError::Validation(
            "graph_path cannot be empty".to_string(),
        ));
    }

    if config.stats_path.is_empty() {
        return Err(ConfigError::Validation(
            "stats_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
