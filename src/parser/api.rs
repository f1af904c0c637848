//! Parsing of `action=parse` JSON responses
//!
//! ```json
//! {
//!   "parse": {
//!     "title": "United Kingdom",
//!     "redirects": [{"from": "UK", "to": "United Kingdom"}],
//!     "text": {"*": "<div class=\"mw-parser-output\">...</div>"},
//!     "links": [{"ns": 0, "exists": "", "*": "England"}]
//!   }
//! }
//! ```
//!
//! A top-level `error` object (e.g. `missingtitle`) means the page does not exist.

use crate::parser::text::{extract_text, LinkSet};
use crate::parser::{PageContent, ParseOutcome};
use crate::ParseError;
use scraper::Html;
use serde::Deserialize;

/// Main article namespace
const ARTICLE_NAMESPACE: i64 = 0;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    parse: Option<ParseSection>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ParseSection {
    title: Option<String>,
    text: Option<TextSection>,
    #[serde(default)]
    links: Vec<ApiLink>,
    #[serde(default)]
    redirects: Vec<ApiRedirect>,
}

#[derive(Debug, Deserialize)]
struct TextSection {
    #[serde(rename = "*", default)]
    html: String,
}

#[derive(Debug, Deserialize)]
struct ApiLink {
    ns: Option<i64>,
    /// Present (as an empty string) only when the target page exists
    exists: Option<serde_json::Value>,
    #[serde(rename = "*")]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRedirect {
    from: String,
}

/// Parses an API response body
///
/// # Arguments
///
/// * `body` - Raw JSON response text
/// * `requested_title` - Title the page was fetched under, used when the
///   response carries no title of its own and in error messages
///
/// # Returns
///
/// * `Ok(ParseOutcome::Found(_))` - Page content
/// * `Ok(ParseOutcome::NotFound)` - The API reported an error for the page
/// * `Err(ParseError)` - Body is not JSON or lacks the expected structure
pub fn parse_api_page(body: &str, requested_title: &str) -> Result<ParseOutcome, ParseError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|source| ParseError::InvalidJson {
            title: requested_title.to_string(),
            source,
        })?;

    if let Some(error) = response.error {
        tracing::warn!("Page not found: {} ({})", requested_title, error);
        return Ok(ParseOutcome::NotFound);
    }

    let parse = response.parse.ok_or_else(|| ParseError::Malformed {
        title: requested_title.to_string(),
        message: "response has neither 'parse' nor 'error'".to_string(),
    })?;

    let text = parse
        .text
        .map(|section| {
            let fragment = Html::parse_fragment(&section.html);
            extract_text(fragment.root_element())
        })
        .unwrap_or_default();

    let mut links = LinkSet::new();
    for link in parse.links {
        let title = link.title.ok_or_else(|| ParseError::Malformed {
            title: requested_title.to_string(),
            message: "link entry without a title".to_string(),
        })?;

        if link.ns == Some(ARTICLE_NAMESPACE) && link.exists.is_some() {
            links.insert(title);
        }
    }

    let redirects = parse
        .redirects
        .into_iter()
        .map(|redirect| redirect.from)
        .collect();

    let title = parse
        .title
        .unwrap_or_else(|| requested_title.to_string());

    tracing::debug!(
        "Parsed page '{}': {} chars, {} links",
        title,
        text.len(),
        links.len()
    );

    Ok(ParseOutcome::Found(PageContent {
        title,
        text,
        links: links.into_vec(),
        redirects,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn found(outcome: ParseOutcome) -> PageContent {
        match outcome {
            ParseOutcome::Found(page) => page,
            ParseOutcome::NotFound => panic!("expected a page"),
        }
    }

    #[test]
    fn test_parse_returns_content() {
        let body = json!({
            "parse": {
                "title": "Python",
                "text": {"*": "<p>Python is a programming language.</p>"},
                "links": [
                    {"ns": 0, "exists": "", "*": "Java"},
                    {"ns": 0, "exists": "", "*": "Ruby"}
                ]
            }
        })
        .to_string();

        let page = found(parse_api_page(&body, "Python").unwrap());

        assert_eq!(page.title, "Python");
        assert_eq!(page.text, "Python is a programming language.");
        assert_eq!(page.links, vec!["Java", "Ruby"]);
        assert!(page.redirects.is_empty());
    }

    #[test]
    fn test_error_response_is_not_found() {
        let body = json!({"error": {"code": "missingtitle"}}).to_string();
        assert!(matches!(
            parse_api_page(&body, "NonexistentPage12345").unwrap(),
            ParseOutcome::NotFound
        ));
    }

    #[test]
    fn test_filters_non_article_and_missing_links() {
        let body = json!({
            "parse": {
                "title": "Test",
                "text": {"*": "<p>Test content</p>"},
                "links": [
                    {"ns": 0, "exists": "", "*": "Article"},
                    {"ns": 14, "exists": "", "*": "Category:Test"},
                    {"ns": 0, "*": "Nonexistent"},
                    {"ns": 0, "exists": null, "*": "Also nonexistent"},
                    {"ns": 0, "exists": "", "*": "article"}
                ]
            }
        })
        .to_string();

        let page = found(parse_api_page(&body, "Test").unwrap());
        assert_eq!(page.links, vec!["Article"]);
    }

    #[test]
    fn test_resolved_title_and_redirect_aliases() {
        let body = json!({
            "parse": {
                "title": "United Kingdom",
                "redirects": [{"from": "UK", "to": "United Kingdom"}],
                "text": {"*": "<p>Country</p>"},
                "links": []
            }
        })
        .to_string();

        let page = found(parse_api_page(&body, "UK").unwrap());
        assert_eq!(page.title, "United Kingdom");
        assert_eq!(page.redirects, vec!["UK"]);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = parse_api_page("<html>not json</html>", "Test");
        assert!(matches!(result, Err(ParseError::InvalidJson { .. })));
    }

    #[test]
    fn test_link_without_title_is_malformed() {
        let body = json!({
            "parse": {
                "title": "Test",
                "text": {"*": "<p>x</p>"},
                "links": [{"ns": 0, "exists": ""}]
            }
        })
        .to_string();

        let result = parse_api_page(&body, "Test");
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_missing_parse_section_is_malformed() {
        let result = parse_api_page("{}", "Test");
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }
}
