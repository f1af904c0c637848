use crate::source::retry::{send_once, with_retry, RetryPolicy};
use crate::source::{PageFormat, PageSource, RawPage};
use crate::{FetchResult, WikiError};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Page source backed by the MediaWiki `action=parse` endpoint
///
/// Requests the rendered text and the link table in one call, letting the
/// API resolve redirects (`redirects=1`).
pub struct ApiSource {
    client: Client,
    endpoint: Url,
    retry: RetryPolicy,
}

impl ApiSource {
    /// Creates a source for the given API endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(ApiSource)` - Source ready to fetch
    /// * `Err(WikiError)` - `endpoint` is not a valid URL
    pub fn new(client: Client, endpoint: &str, retry: RetryPolicy) -> Result<Self, WikiError> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            retry,
        })
    }
}

#[async_trait]
impl PageSource for ApiSource {
    async fn fetch(&self, title: &str) -> FetchResult<RawPage> {
        tracing::debug!("Fetching page via API: {}", title);

        let fetched = with_retry(&self.retry, title, || {
            let request = self.client.get(self.endpoint.clone()).query(&[
                ("action", "parse"),
                ("page", title),
                ("format", "json"),
                ("prop", "text|links"),
                ("redirects", "1"),
            ]);
            send_once(request, title)
        })
        .await?;

        Ok(RawPage {
            format: PageFormat::Api,
            status: fetched.status,
            url: fetched.url,
            body: fetched.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(
            3,
            Duration::from_millis(10),
            Duration::from_millis(100),
            1.0,
            Duration::from_millis(10),
        )
    }

    fn source_for(server: &MockServer) -> ApiSource {
        ApiSource::new(
            Client::new(),
            &format!("{}/w/api.php", server.uri()),
            fast_retry(),
        )
        .unwrap()
    }

    fn parse_body(title: &str) -> serde_json::Value {
        serde_json::json!({
            "parse": {
                "title": title,
                "text": {"*": "<p>Content</p>"},
                "links": []
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_sends_parse_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("action", "parse"))
            .and(query_param("page", "Python (programming language)"))
            .and(query_param("format", "json"))
            .and(query_param("prop", "text|links"))
            .and(query_param("redirects", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(parse_body("Python")))
            .expect(1)
            .mount(&server)
            .await;

        let raw = source_for(&server)
            .fetch("Python (programming language)")
            .await
            .unwrap();

        assert_eq!(raw.format, PageFormat::Api);
        assert_eq!(raw.status, 200);
        assert!(raw.body.contains("\"Python\""));
    }

    #[tokio::test]
    async fn test_retries_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(parse_body("Test")))
            .expect(1)
            .mount(&server)
            .await;

        let raw = source_for(&server).fetch("Test").await.unwrap();
        assert_eq!(raw.status, 200);
    }

    #[tokio::test]
    async fn test_retries_on_rate_limit_with_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0.05"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(parse_body("Test")))
            .expect(1)
            .mount(&server)
            .await;

        assert!(source_for(&server).fetch("Test").await.is_ok());
    }

    #[tokio::test]
    async fn test_raises_after_max_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let error = source_for(&server).fetch("Test").await.unwrap_err();
        assert!(error.is_recoverable());
        assert_eq!(error.status(), Some(500));
    }

    #[tokio::test]
    async fn test_does_not_retry_on_client_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let error = source_for(&server).fetch("Test").await.unwrap_err();
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_retries_on_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(parse_body("Slow"))
                    .set_delay(Duration::from_secs(2)),
            )
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(parse_body("Test")))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let source = ApiSource::new(
            client,
            &format!("{}/w/api.php", server.uri()),
            fast_retry(),
        )
        .unwrap();

        let raw = source.fetch("Test").await.unwrap();
        assert!(raw.body.contains("\"Test\""));
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let result = ApiSource::new(Client::new(), "not a url", RetryPolicy::default());
        assert!(matches!(result, Err(WikiError::UrlParse(_))));
    }
}
