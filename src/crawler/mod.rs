//! Traversal engine for walking the article link graph
//!
//! This module contains the core crawling logic, including:
//! - Title normalization for deduplication
//! - Request scheduling and rate limiting
//! - Recursive traversal coordination

mod coordinator;
mod scheduler;

pub use coordinator::{FailureKind, TraversalError, TraversalResult, Traverser};
pub use scheduler::{FetchPermit, Scheduler};

use crate::config::Config;
use crate::parser::WikiParser;
use crate::source::{build_http_client, build_source};
use crate::WikiError;
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes a title into its deduplication key
///
/// Percent-encoding is decoded, underscores become spaces, surrounding
/// whitespace is trimmed, and the result is NFC-normalized and lowercased.
/// The key is only used for equality checks, never for display.
///
/// # Example
///
/// ```
/// use wiki_ripple::normalize_title;
///
/// assert_eq!(normalize_title("Python_(programming_language)"), "python (programming language)");
/// assert_eq!(normalize_title("C%2B%2B"), "c++");
/// ```
pub fn normalize_title(title: &str) -> String {
    percent_decode_str(title)
        .decode_utf8_lossy()
        .replace('_', " ")
        .trim()
        .nfc()
        .collect::<String>()
        .to_lowercase()
}

/// Builds a traverser wired to the configured page source
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Traverser)` - Ready to traverse
/// * `Err(WikiError)` - The HTTP client or source could not be built
pub fn build_traverser(config: &Config) -> Result<Traverser, WikiError> {
    let client = build_http_client(config)?;
    let source = build_source(config, client)?;

    tracing::debug!(
        "Traverser using {:?} source, {} concurrent requests, {} requests/s",
        config.source.kind,
        config.crawler.max_concurrent_requests,
        config.crawler.max_requests_per_second
    );

    Ok(Traverser::new(
        source,
        Arc::new(WikiParser),
        config.crawler.clone(),
    ))
}
