use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Wiki-Ripple
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

/// Traversal shaping configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight across one traversal
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Maximum number of fetch starts per second across one traversal
    #[serde(rename = "max-requests-per-second")]
    pub max_requests_per_second: f64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 60,
            max_requests_per_second: 5.0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the identifying agent string: `Name/Version (+ContactURL; ContactEmail)`
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "wiki-ripple".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/wiki-ripple/wiki-ripple".to_string(),
            contact_email: "contact@example.com".to_string(),
        }
    }
}

/// HTTP client timeouts, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: f64,

    /// Whole-request timeout, body included
    #[serde(rename = "request-timeout")]
    pub request_timeout: f64,

    #[serde(rename = "pool-idle-timeout")]
    pub pool_idle_timeout: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10.0,
            request_timeout: 30.0,
            pool_idle_timeout: 120.0,
        }
    }
}

/// Retry policy for recoverable fetch failures, waits in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    #[serde(rename = "min-wait")]
    pub min_wait: f64,

    #[serde(rename = "max-wait")]
    pub max_wait: f64,

    pub multiplier: f64,

    /// Upper bound of the random jitter added to `Retry-After` waits
    #[serde(rename = "jitter-max")]
    pub jitter_max: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_wait: 1.0,
            max_wait: 30.0,
            multiplier: 2.0,
            jitter_max: 1.0,
        }
    }
}

/// Which page source variant to fetch through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Structured `action=parse` JSON endpoint
    #[default]
    Api,
    /// Direct article HTML
    Html,
}

/// Page source endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,

    #[serde(rename = "api-endpoint")]
    pub api_endpoint: String,

    /// Site root used to build `/wiki/<title>` article URLs
    #[serde(rename = "site-url")]
    pub site_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Api,
            api_endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
            site_url: "https://en.wikipedia.org".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the crate's own log targets
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Converts a seconds value from the config into a `Duration`
///
/// Negative and non-finite values clamp to zero, values too large for a
/// `Duration` saturate at `Duration::MAX`.
pub fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
