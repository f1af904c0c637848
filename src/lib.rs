//! Wiki-Ripple: recursive Wikipedia word-frequency crawler
//!
//! This crate walks the Wikipedia link graph from a starting article up to a
//! bounded depth, extracts plain text from every page it reaches, and
//! aggregates word-frequency statistics over the collected text.

pub mod config;
pub mod crawler;
pub mod frequency;
pub mod parser;
pub mod source;

use thiserror::Error;

/// Main error type for Wiki-Ripple operations
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classified failure of a single page fetch
///
/// `Recoverable` failures are retried by the page sources; `Fatal` ones are
/// surfaced on first occurrence.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Timeout, connection failure, HTTP 429 or HTTP 5xx
    #[error("{message}")]
    Recoverable {
        message: String,
        status: Option<u16>,
        /// Server supplied `Retry-After` hint in seconds
        retry_after: Option<f64>,
    },

    /// Any other 4xx response or a request that could not be built/sent
    #[error("{message}")]
    Fatal {
        message: String,
        status: Option<u16>,
    },
}

impl FetchError {
    /// Returns true if the failure is eligible for retry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable { .. })
    }

    /// Returns the `Retry-After` hint carried by a recoverable failure
    pub fn retry_after(&self) -> Option<f64> {
        match self {
            Self::Recoverable { retry_after, .. } => *retry_after,
            Self::Fatal { .. } => None,
        }
    }

    /// Returns the HTTP status that triggered the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Recoverable { status, .. } | Self::Fatal { status, .. } => *status,
        }
    }
}

/// Errors raised while turning a raw page into [`parser::PageContent`]
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON response for '{title}': {source}")]
    InvalidJson {
        title: String,
        source: serde_json::Error,
    },

    #[error("Malformed response for '{title}': {message}")]
    Malformed { title: String, message: String },
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

/// Result type alias for Wiki-Ripple operations
pub type Result<T> = std::result::Result<T, WikiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for single page fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{normalize_title, TraversalError, TraversalResult, Traverser};
pub use frequency::{calculate, WordFrequency};
pub use parser::{PageContent, ParseOutcome};
pub use source::{PageSource, RawPage};
