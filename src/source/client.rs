use crate::config::{seconds, Config};
use crate::{ConfigError, WikiError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;

/// Builds an HTTP client with proper configuration
///
/// The identifying agent string is sent both as `User-Agent` and as
/// `Api-User-Agent`, which the MediaWiki API reads from browser-like clients.
/// Redirects are followed with reqwest's default policy.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(WikiError)` - The agent string is not a valid header value, or
///   the client could not be built
///
/// # Example
///
/// ```no_run
/// use wiki_ripple::config::Config;
/// use wiki_ripple::source::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, WikiError> {
    let user_agent = config.user_agent.user_agent();
    let agent_header = HeaderValue::from_str(&user_agent).map_err(|e| {
        ConfigError::Validation(format!("Invalid user agent '{}': {}", user_agent, e))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert("Api-User-Agent", agent_header);

    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(seconds(config.http.request_timeout))
        .connect_timeout(seconds(config.http.connect_timeout))
        .pool_idle_timeout(seconds(config.http.pool_idle_timeout))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}
