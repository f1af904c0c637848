use crate::config::types::{
    Config, CrawlerConfig, HttpConfig, LoggingConfig, RetryConfig, SourceConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound for every seconds value: one day
const MAX_SECONDS: f64 = 86_400.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_source_config(&config.source)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates traversal shaping limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 1000, got {}",
            config.max_concurrent_requests
        )));
    }

    if !config.max_requests_per_second.is_finite()
        || config.max_requests_per_second < 1.0 / MAX_SECONDS
    {
        return Err(ConfigError::Validation(format!(
            "max_requests_per_second must be at least one per {} seconds, got {}",
            MAX_SECONDS, config.max_requests_per_second
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    validate_positive_seconds("connect_timeout", config.connect_timeout)?;
    validate_positive_seconds("request_timeout", config.request_timeout)?;
    validate_positive_seconds("pool_idle_timeout", config.pool_idle_timeout)?;
    Ok(())
}

/// Validates retry attempts and wait bounds
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    validate_non_negative_seconds("min_wait", config.min_wait)?;
    validate_non_negative_seconds("max_wait", config.max_wait)?;
    validate_non_negative_seconds("jitter_max", config.jitter_max)?;

    if config.max_wait < config.min_wait {
        return Err(ConfigError::Validation(format!(
            "max_wait ({}) must be >= min_wait ({})",
            config.max_wait, config.min_wait
        )));
    }

    if !config.multiplier.is_finite() || config.multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "multiplier must be >= 1.0, got {}",
            config.multiplier
        )));
    }

    Ok(())
}

/// Validates the page source endpoints
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("api_endpoint", &config.api_endpoint)?;
    validate_http_url("site_url", &config.site_url)?;
    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

    if !LEVELS.contains(&config.level.to_lowercase().as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging level must be one of {:?}, got '{}'",
            LEVELS, config.level
        )));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

fn validate_positive_seconds(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 || value > MAX_SECONDS {
        return Err(ConfigError::Validation(format!(
            "{} must be > 0 and <= {} seconds, got {}",
            field, MAX_SECONDS, value
        )));
    }
    Ok(())
}

fn validate_non_negative_seconds(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 || value > MAX_SECONDS {
        return Err(ConfigError::Validation(format!(
            "{} must be >= 0 and <= {} seconds, got {}",
            field, MAX_SECONDS, value
        )));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_crawler_limits() {
        let mut config = Config::default();
        config.crawler.max_concurrent_requests = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.max_requests_per_second = 0.0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.max_requests_per_second = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_retry_bounds() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.retry.min_wait = 5.0;
        config.retry.max_wait = 1.0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.retry.multiplier = 0.5;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.retry.jitter_max = -1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_source_urls() {
        let mut config = Config::default();
        config.source.api_endpoint = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        let mut config = Config::default();
        config.source.site_url = "ftp://en.wikipedia.org".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_crawler_name() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_logging_level() {
        let mut config = Config::default();
        config.logging.level = "DEBUG".to_string();
        assert!(validate(&config).is_ok());

        config.logging.level = "loud".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
