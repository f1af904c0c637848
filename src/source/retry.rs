//! Retry driver and response classification shared by the page sources
//!
//! A single request attempt ends in one of three ways: the response body,
//! a [`FetchError::Recoverable`] failure (timeout, connection failure, 429,
//! 5xx) or a [`FetchError::Fatal`] one (other 4xx, unsendable request).
//! [`with_retry`] repeats recoverable attempts up to the configured budget.
//!
//! # Wait Times
//!
//! | Triggering failure            | Wait before next attempt                        |
//! |-------------------------------|-------------------------------------------------|
//! | Recoverable with Retry-After  | `retry_after + uniform(0, jitter_max)`          |
//! | Recoverable without hint      | `min(max_wait, min_wait * multiplier^(n - 1))`  |
//! | Fatal                         | no retry                                        |

use crate::config::{seconds, RetryConfig};
use crate::{FetchError, FetchResult};
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use std::future::Future;
use std::time::Duration;

/// Attempt budget and wait-time parameters for recoverable failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    min_wait: Duration,
    max_wait: Duration,
    multiplier: f64,
    jitter_max: Duration,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        min_wait: Duration,
        max_wait: Duration,
        multiplier: f64,
        jitter_max: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_wait,
            max_wait,
            multiplier,
            jitter_max,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            seconds(config.min_wait),
            seconds(config.max_wait),
            config.multiplier,
            seconds(config.jitter_max),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Exponential backoff for the given 1-based attempt number
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.powi(exponent);
        let wait = self.min_wait.as_secs_f64() * factor;

        if !wait.is_finite() || wait >= self.max_wait.as_secs_f64() {
            self.max_wait
        } else {
            Duration::try_from_secs_f64(wait).unwrap_or(self.max_wait)
        }
    }

    /// Wait before retrying after `error` ended attempt number `attempt`
    pub fn wait_for(&self, error: &FetchError, attempt: u32) -> Duration {
        match error.retry_after() {
            Some(hint) => seconds(hint).saturating_add(self.jitter()),
            None => self.backoff_delay(attempt),
        }
    }

    fn jitter(&self) -> Duration {
        if self.jitter_max.is_zero() {
            return Duration::ZERO;
        }
        let max = self.jitter_max.as_secs_f64();
        Duration::try_from_secs_f64(rand::thread_rng().gen_range(0.0..=max))
            .unwrap_or(self.jitter_max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Runs `attempt` until it succeeds, fails fatally, or the budget runs out
///
/// After the last attempt the final recoverable error is returned unchanged.
///
/// # Arguments
///
/// * `policy` - Attempt budget and wait parameters
/// * `context` - Page title, used in log messages
/// * `attempt` - Performs one request attempt
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, context: &str, mut attempt: F) -> FetchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FetchResult<T>>,
{
    let mut number = 1;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_recoverable() && number < policy.max_attempts() => {
                let wait = policy.wait_for(&error, number);
                tracing::warn!(
                    "Attempt {}/{} for '{}' failed: {}; retrying in {:?}",
                    number,
                    policy.max_attempts(),
                    context,
                    error,
                    wait
                );
                tokio::time::sleep(wait).await;
                number += 1;
            }
            Err(error) => {
                if error.is_recoverable() {
                    tracing::warn!(
                        "Giving up on '{}' after {} attempts: {}",
                        context,
                        number,
                        error
                    );
                }
                return Err(error);
            }
        }
    }
}

/// Response of a successful attempt
#[derive(Debug)]
pub(crate) struct Fetched {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// Sends one request and reads its body, classifying every failure
pub(crate) async fn send_once(request: RequestBuilder, title: &str) -> FetchResult<Fetched> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_transport_error(&e, title))?;

    let status = response.status();
    if let Some(error) = classify_status(status, response.headers(), title) {
        return Err(error);
    }

    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| classify_transport_error(&e, title))?;

    tracing::debug!("Fetched '{}' ({}, {} bytes)", title, status, body.len());

    Ok(Fetched {
        status: status.as_u16(),
        url,
        body,
    })
}

/// Classifies a failed request or body read
///
/// Timeouts and connection failures are recoverable; anything else (invalid
/// URL, redirect loop, broken body) is not.
pub fn classify_transport_error(error: &reqwest::Error, title: &str) -> FetchError {
    if error.is_timeout() {
        tracing::warn!("Timeout fetching page '{}': {}", title, error);
        FetchError::Recoverable {
            message: format!("Timeout fetching page '{}': {}", title, error),
            status: None,
            retry_after: None,
        }
    } else if error.is_connect() {
        tracing::warn!("Connection error fetching page '{}': {}", title, error);
        FetchError::Recoverable {
            message: format!("Connection failed for '{}': {}", title, error),
            status: None,
            retry_after: None,
        }
    } else {
        tracing::error!("Request error fetching page '{}': {}", title, error);
        FetchError::Fatal {
            message: format!("Request failed for '{}': {}", title, error),
            status: error.status().map(|s| s.as_u16()),
        }
    }
}

/// Maps an HTTP status to a fetch failure, or `None` for a usable response
pub fn classify_status(status: StatusCode, headers: &HeaderMap, title: &str) -> Option<FetchError> {
    let code = status.as_u16();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = parse_retry_after(headers);
        tracing::warn!(
            "Rate limited fetching '{}', retry-after: {:?}",
            title,
            retry_after
        );
        return Some(FetchError::Recoverable {
            message: format!("Rate limited while fetching '{}'", title),
            status: Some(code),
            retry_after,
        });
    }

    if status.is_server_error() {
        tracing::warn!("Server error {} fetching '{}'", code, title);
        return Some(FetchError::Recoverable {
            message: format!("Server error {} fetching '{}'", code, title),
            status: Some(code),
            retry_after: None,
        });
    }

    if status.is_client_error() {
        tracing::error!("HTTP error {} fetching page '{}'", code, title);
        return Some(FetchError::Fatal {
            message: format!("HTTP {} fetching '{}'", code, title),
            status: Some(code),
        });
    }

    None
}

/// Reads the `Retry-After` header as a number of seconds
///
/// Absent, negative or unparsable values (including HTTP dates) yield `None`.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<f64> {
    let raw = headers.get(RETRY_AFTER)?;
    let value = raw.to_str().ok()?.trim();

    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Some(secs),
        _ => {
            tracing::warn!("Could not parse Retry-After header: {}", value);
            None
        }
    }
}
