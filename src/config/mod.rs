//! Configuration module for Wiki-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The resulting [`Config`] is built once at startup and handed by reference to
//! the page source, the traverser and the command line front end.
//!
//! # Example
//!
//! ```no_run
//! use wiki_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wiki-ripple.toml")).unwrap();
//! println!("Max concurrent requests: {}", config.crawler.max_concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    seconds, Config, CrawlerConfig, HttpConfig, LoggingConfig, RetryConfig, SourceConfig,
    SourceKind, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
