//! Traversal coordinator - recursive link-graph walk
//!
//! Each call to [`Traverser::traverse`] owns:
//! - One [`Scheduler`] gate shared by every branch of that call
//! - One result accumulator holding texts, visited titles and errors
//!
//! A node is marked visited before its fetch starts, so every normalized
//! title is dispatched at most once. Failures are recorded on the result and
//! never cancel sibling or parent branches.

use crate::config::CrawlerConfig;
use crate::crawler::normalize_title;
use crate::crawler::scheduler::Scheduler;
use crate::parser::{PageContent, PageParser, ParseOutcome};
use crate::source::PageSource;
use crate::FetchError;
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Failure class of a [`TraversalError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Retry budget exhausted on timeouts, connection failures, 429 or 5xx
    Recoverable,
    /// Non-retryable HTTP failure
    Fatal,
    /// Body could not be parsed
    Parse,
}

/// Terminal failure recorded for one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalError {
    /// Title as it was requested
    pub title: String,
    pub error: String,
    pub kind: FailureKind,
}

impl TraversalError {
    fn from_fetch(title: &str, error: &FetchError) -> Self {
        let kind = if error.is_recoverable() {
            FailureKind::Recoverable
        } else {
            FailureKind::Fatal
        };

        Self {
            title: title.to_string(),
            error: error.to_string(),
            kind,
        }
    }
}

/// Accumulated output of one traversal
#[derive(Debug, Clone, Default)]
pub struct TraversalResult {
    /// Text of every successfully fetched page, in completion order
    pub texts: Vec<String>,

    /// Normalized titles of every dispatched page, plus canonical titles
    /// and redirect aliases of fetched pages
    pub visited: HashSet<String>,

    pub errors: Vec<TraversalError>,
}

/// State shared by all branches of one `traverse` call
struct Run {
    scheduler: Scheduler,
    result: Mutex<TraversalResult>,
}

impl Run {
    fn result(&self) -> MutexGuard<'_, TraversalResult> {
        self.result.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Walks the article link graph from a start title
pub struct Traverser {
    source: Arc<dyn PageSource>,
    parser: Arc<dyn PageParser>,
    crawler: CrawlerConfig,
}

impl Traverser {
    /// Creates a new traverser
    ///
    /// # Arguments
    ///
    /// * `source` - Fetches raw pages by title
    /// * `parser` - Turns raw pages into [`PageContent`]
    /// * `crawler` - Concurrency and rate limits applied per traversal
    pub fn new(
        source: Arc<dyn PageSource>,
        parser: Arc<dyn PageParser>,
        crawler: CrawlerConfig,
    ) -> Self {
        Self {
            source,
            parser,
            crawler,
        }
    }

    /// Traverses from `title` up to `depth` link hops away
    ///
    /// `depth = 0` fetches only the start article. Never fails: per-page
    /// failures are collected in [`TraversalResult::errors`].
    pub async fn traverse(&self, title: &str, depth: u32) -> TraversalResult {
        tracing::info!("Starting traversal from '{}' at depth {}", title, depth);

        let run = Run {
            scheduler: Scheduler::from_config(&self.crawler),
            result: Mutex::new(TraversalResult::default()),
        };

        self.visit(&run, title.to_string(), depth).await;

        let result = run
            .result
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        tracing::info!(
            "Traversal from '{}' complete: {} pages fetched, {} visited, {} errors",
            title,
            result.texts.len(),
            result.visited.len(),
            result.errors.len()
        );

        result
    }

    fn visit<'a>(&'a self, run: &'a Run, title: String, depth: u32) -> BoxFuture<'a, ()> {
        async move {
            // Check-and-mark happens under one lock
            if !run.result().visited.insert(normalize_title(&title)) {
                tracing::trace!("Already visited: {}", title);
                return;
            }

            let Some(permit) = run.scheduler.admit().await else {
                return;
            };
            let outcome = self.fetch_page(&title).await;
            drop(permit);

            let page = match outcome {
                Ok(ParseOutcome::Found(page)) => page,
                Ok(ParseOutcome::NotFound) => {
                    tracing::debug!("Skipping missing page '{}'", title);
                    return;
                }
                Err(error) => {
                    tracing::warn!("Failed to process '{}': {}", title, error.error);
                    run.result().errors.push(error);
                    return;
                }
            };

            let PageContent {
                title: canonical,
                text,
                links,
                redirects,
            } = page;

            {
                let mut result = run.result();
                result.texts.push(text);
                result.visited.insert(normalize_title(&canonical));
                for alias in &redirects {
                    result.visited.insert(normalize_title(alias));
                }
            }

            if depth == 0 {
                return;
            }

            tracing::debug!(
                "Expanding {} links from '{}' (remaining depth {})",
                links.len(),
                canonical,
                depth - 1
            );

            join_all(
                links
                    .into_iter()
                    .map(|link| self.visit(run, link, depth - 1)),
            )
            .await;
        }
        .boxed()
    }

    async fn fetch_page(&self, title: &str) -> Result<ParseOutcome, TraversalError> {
        let raw = self
            .source
            .fetch(title)
            .await
            .map_err(|e| TraversalError::from_fetch(title, &e))?;

        self.parser
            .parse(&raw, title)
            .map_err(|e| TraversalError {
                title: title.to_string(),
                error: e.to_string(),
                kind: FailureKind::Parse,
            })
    }
}
