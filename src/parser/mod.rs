//! Page parser: turns a [`RawPage`] into normalized [`PageContent`]
//!
//! This module handles:
//! - Detecting "page does not exist" responses ([`ParseOutcome::NotFound`])
//! - Stripping non-content markup and cleaning the remaining text
//! - Extracting internal article links and redirect aliases
//!
//! It knows nothing about networking or traversal.

mod api;
mod html;
mod text;

pub use api::parse_api_page;
pub use html::{article_title_from_href, parse_html_page};
pub use text::{clean_text, LinkSet};

use crate::source::{PageFormat, RawPage};
use crate::ParseError;

/// Content extracted from one successfully fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// Canonical title as reported by the page itself
    pub title: String,

    /// Plain text of the article body
    pub text: String,

    /// Outgoing article links, unique and in first-seen order
    pub links: Vec<String>,

    /// Titles that redirect to this page
    pub redirects: Vec<String>,
}

/// Result of parsing a raw page
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Found(PageContent),

    /// The source reported that the page does not exist
    NotFound,
}

/// Capability to parse a raw page fetched under `requested_title`
pub trait PageParser: Send + Sync {
    fn parse(&self, raw: &RawPage, requested_title: &str) -> Result<ParseOutcome, ParseError>;
}

/// Parser for both Wikipedia page formats
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiParser;

impl PageParser for WikiParser {
    fn parse(&self, raw: &RawPage, requested_title: &str) -> Result<ParseOutcome, ParseError> {
        if raw.is_missing() {
            tracing::debug!("Page not found: {}", requested_title);
            return Ok(ParseOutcome::NotFound);
        }

        match raw.format {
            PageFormat::Api => parse_api_page(&raw.body, requested_title),
            PageFormat::Html => parse_html_page(&raw.body, &raw.url, requested_title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(format: PageFormat, status: u16, body: &str) -> RawPage {
        RawPage {
            format,
            status,
            url: "https://en.wikipedia.org/wiki/Test".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_dispatches_on_format() {
        let api = raw(
            PageFormat::Api,
            200,
            r#"{"parse": {"title": "Test", "text": {"*": "<p>api</p>"}, "links": []}}"#,
        );
        let html = raw(PageFormat::Html, 200, "<html><body><p>html</p></body></html>");

        match WikiParser.parse(&api, "Test").unwrap() {
            ParseOutcome::Found(page) => assert_eq!(page.text, "api"),
            ParseOutcome::NotFound => panic!("expected a page"),
        }
        match WikiParser.parse(&html, "Test").unwrap() {
            ParseOutcome::Found(page) => assert_eq!(page.text, "html"),
            ParseOutcome::NotFound => panic!("expected a page"),
        }
    }

    #[test]
    fn test_missing_html_page_is_not_found() {
        let missing = raw(PageFormat::Html, 404, "");
        assert_eq!(WikiParser.parse(&missing, "Test").unwrap(), ParseOutcome::NotFound);
    }
}
