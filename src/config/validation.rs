use crate::config::types::{Config, RemoteConfig, StoreConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_remote_config(&config.remote)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_store_config(&config.store)?;
    Ok(())
}

/// Validates remote manifest and request settings
fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.manifest_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid manifest-url: {}", e)))?;

    match url.scheme() {
        "https" => {}
        "http" if !config.https_only => {}
        scheme => {
            return Err(ConfigError::Validation(format!(
                "manifest-url must use HTTPS{}, got '{}'",
                if config.https_only { "" } else { " or HTTP" },
                scheme
            )));
        }
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.poll_interval_ms < 1 || config.poll_interval_ms > 5000 {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms must be between 1 and 5000, got {}",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config.name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    if config.version.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
