//! Page sources: fetch one article's raw representation over the network
//!
//! Two interchangeable variants implement [`PageSource`]:
//! - [`ApiSource`] queries the structured `action=parse` JSON endpoint
//! - [`HtmlSource`] downloads the rendered article HTML
//!
//! Both share the retry driver and error classification in [`retry`], so a
//! traversal can use either without knowing which one it holds. Rate and
//! concurrency shaping happen around these calls, in the crawler.

mod api;
mod client;
mod html;
pub mod retry;

pub use api::ApiSource;
pub use client::build_http_client;
pub use html::{article_url, HtmlSource};
pub use retry::{parse_retry_after, with_retry, RetryPolicy};

use crate::config::{Config, SourceKind};
use crate::{FetchResult, WikiError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Which representation a [`RawPage`] body holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    /// JSON document from the `action=parse` API
    Api,
    /// Full article HTML document
    Html,
}

/// Unparsed response for a single page fetch
#[derive(Debug, Clone)]
pub struct RawPage {
    pub format: PageFormat,

    /// HTTP status of the final response
    pub status: u16,

    /// Final URL after redirects
    pub url: String,

    pub body: String,
}

impl RawPage {
    /// Returns true if the response says the article does not exist
    pub fn is_missing(&self) -> bool {
        self.status == 404
    }
}

/// Capability to fetch a page by title
///
/// Implementations retry recoverable failures internally and surface
/// [`crate::FetchError::Fatal`] immediately.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, title: &str) -> FetchResult<RawPage>;
}

/// Builds the page source selected by `config.source.kind`
///
/// # Returns
///
/// * `Ok(Arc<dyn PageSource>)` - Source sharing the given client
/// * `Err(WikiError)` - An endpoint in the configuration is not a valid URL
pub fn build_source(config: &Config, client: Client) -> Result<Arc<dyn PageSource>, WikiError> {
    let retry = RetryPolicy::from_config(&config.retry);

    let source: Arc<dyn PageSource> = match config.source.kind {
        SourceKind::Api => Arc::new(ApiSource::new(client, &config.source.api_endpoint, retry)?),
        SourceKind::Html => Arc::new(HtmlSource::new(client, &config.source.site_url, retry)?),
    };

    Ok(source)
}
