use crate::source::retry::{send_once, with_retry, RetryPolicy};
use crate::source::{PageFormat, PageSource, RawPage};
use crate::{FetchError, FetchResult, WikiError};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use url::Url;

/// Characters left unescaped in article paths
const TITLE_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Page source that downloads rendered article HTML from `/wiki/<title>`
///
/// HTTP redirects (e.g. from an alias title) are followed by the client.
/// A 404 is reported as a missing page rather than an error.
pub struct HtmlSource {
    client: Client,
    site: Url,
    retry: RetryPolicy,
}

impl HtmlSource {
    /// Creates a source for the given site root (e.g. `https://en.wikipedia.org`)
    pub fn new(client: Client, site_url: &str, retry: RetryPolicy) -> Result<Self, WikiError> {
        Ok(Self {
            client,
            site: Url::parse(site_url)?,
            retry,
        })
    }
}

/// Builds the article URL for a title
///
/// Spaces become underscores and everything outside `[A-Za-z0-9_.~/-]` is
/// percent-encoded.
///
/// # Example
///
/// ```
/// use url::Url;
/// use wiki_ripple::source::article_url;
///
/// let site = Url::parse("https://en.wikipedia.org").unwrap();
/// assert_eq!(
///     article_url(&site, "Python (programming language)"),
///     "https://en.wikipedia.org/wiki/Python_%28programming_language%29"
/// );
/// ```
pub fn article_url(site: &Url, title: &str) -> String {
    let slug = title.trim().replace(' ', "_");
    format!(
        "{}/wiki/{}",
        site.as_str().trim_end_matches('/'),
        utf8_percent_encode(&slug, TITLE_PATH)
    )
}

#[async_trait]
impl PageSource for HtmlSource {
    async fn fetch(&self, title: &str) -> FetchResult<RawPage> {
        let url = article_url(&self.site, title);
        tracing::debug!("Fetching page HTML: {} ({})", title, url);

        let outcome = with_retry(&self.retry, title, || {
            let request = self.client.get(url.as_str());
            send_once(request, title)
        })
        .await;

        match outcome {
            Ok(fetched) => Ok(RawPage {
                format: PageFormat::Html,
                status: fetched.status,
                url: fetched.url,
                body: fetched.body,
            }),
            Err(FetchError::Fatal {
                status: Some(404), ..
            }) => {
                tracing::debug!("Page not found: {}", title);
                Ok(RawPage {
                    format: PageFormat::Html,
                    status: 404,
                    url,
                    body: String::new(),
                })
            }
            Err(error) => Err(error),
        }
    }
}
