//! Parsing of rendered article HTML
//!
//! # Extraction Rules
//!
//! - **Title:** `#firstHeading`, else `<title>` without the ` - Wikipedia`
//!   suffix, else the requested title
//! - **Text:** `#mw-content-text` (falling back to `<body>`) with
//!   non-content blocks removed
//! - **Links:** `/wiki/<Title>` anchors on the same site, excluding red links,
//!   anchors inside non-content blocks and non-article namespaces; fragments and queries stripped,
//!   percent-encoding decoded, underscores turned into spaces
//! - **Redirects:** the `wgRedirectedFrom` entry of the page config script

use crate::parser::text::{clean_text, extract_text, is_excluded, LinkSet};
use crate::parser::{PageContent, ParseOutcome};
use crate::ParseError;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Namespaces whose pages are not articles
const NON_ARTICLE_NAMESPACES: &[&str] = &[
    "media",
    "special",
    "talk",
    "user",
    "wikipedia",
    "wp",
    "project",
    "file",
    "image",
    "mediawiki",
    "template",
    "help",
    "category",
    "portal",
    "draft",
    "timedtext",
    "module",
    "book",
    "gadget",
    "gadget definition",
    "education program",
];

static CONTENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#mw-content-text").unwrap());
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("#firstHeading").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static REDIRECTED_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""wgRedirectedFrom"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// Parses an article HTML document
///
/// # Arguments
///
/// * `body` - Full HTML document
/// * `page_url` - Final URL the document was served from; anchors pointing at
///   other hosts are ignored
/// * `requested_title` - Title the page was fetched under
///
/// # Returns
///
/// * `Ok(ParseOutcome::Found(_))` - Page content
/// * `Err(ParseError::Malformed)` - The body is empty
pub fn parse_html_page(
    body: &str,
    page_url: &str,
    requested_title: &str,
) -> Result<ParseOutcome, ParseError> {
    if body.trim().is_empty() {
        return Err(ParseError::Malformed {
            title: requested_title.to_string(),
            message: "empty HTML document".to_string(),
        });
    }

    let document = Html::parse_document(body);
    let host = Url::parse(page_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase));

    let content = document
        .select(&CONTENT_SELECTOR)
        .next()
        .or_else(|| document.select(&BODY_SELECTOR).next())
        .unwrap_or_else(|| document.root_element());

    let title = extract_title(&document).unwrap_or_else(|| requested_title.to_string());
    let text = extract_text(content);
    let links = extract_links(content, host.as_deref());
    let redirects = extract_redirects(body);

    tracing::debug!(
        "Parsed page '{}': {} chars, {} links",
        title,
        text.len(),
        links.len()
    );

    Ok(ParseOutcome::Found(PageContent {
        title,
        text,
        links,
        redirects,
    }))
}

fn extract_title(document: &Html) -> Option<String> {
    let heading = document
        .select(&HEADING_SELECTOR)
        .next()
        .map(|element| clean_text(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|s| !s.is_empty());

    heading.or_else(|| {
        document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|element| element.text().collect::<String>())
            .map(|title| {
                let title = title.trim();
                title
                    .strip_suffix(" - Wikipedia")
                    .unwrap_or(title)
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty())
    })
}

fn extract_links(content: ElementRef<'_>, host: Option<&str>) -> Vec<String> {
    let mut links = LinkSet::new();

    for anchor in content.select(&ANCHOR_SELECTOR) {
        // Red links point at pages that do not exist yet
        if anchor.value().classes().any(|class| class == "new") {
            continue;
        }

        // Navigation boxes, sidebars and reference lists
        if anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| is_excluded(ancestor.value()))
        {
            continue;
        }

        if let Some(title) = anchor
            .value()
            .attr("href")
            .and_then(|href| article_title_from_href(href, host))
        {
            links.insert(title);
        }
    }

    links.into_vec()
}

/// Turns an article href into a display title
///
/// Returns `None` for anything that is not a same-site article link:
/// other hosts, non-`/wiki/` paths, bare fragments and namespaced pages.
///
/// # Example
///
/// ```
/// use wiki_ripple::parser::article_title_from_href;
///
/// assert_eq!(
///     article_title_from_href("/wiki/C%2B%2B#History", None),
///     Some("C++".to_string())
/// );
/// assert_eq!(article_title_from_href("/wiki/Category:Languages", None), None);
/// ```
pub fn article_title_from_href(href: &str, host: Option<&str>) -> Option<String> {
    let href = href.trim();

    let path = if href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//") {
        let absolute = if href.starts_with("//") {
            format!("https:{}", href)
        } else {
            href.to_string()
        };
        let url = Url::parse(&absolute).ok()?;
        let link_host = url.host_str()?.to_lowercase();
        if host.map(|h| h != link_host).unwrap_or(true) {
            return None;
        }
        url.path().to_string()
    } else {
        href.to_string()
    };

    let slug = path.strip_prefix("/wiki/")?;
    let slug = slug.split(['#', '?']).next().unwrap_or_default();

    let title = percent_decode_str(slug)
        .decode_utf8_lossy()
        .replace('_', " ")
        .trim()
        .to_string();

    if title.is_empty() || is_namespaced(&title) {
        return None;
    }

    Some(title)
}

fn is_namespaced(title: &str) -> bool {
    match title.split_once(':') {
        Some((prefix, _)) => {
            let prefix = prefix.trim().to_lowercase();
            NON_ARTICLE_NAMESPACES.contains(&prefix.as_str()) || prefix.ends_with(" talk")
        }
        None => false,
    }
}

fn extract_redirects(body: &str) -> Vec<String> {
    REDIRECTED_FROM
        .captures_iter(body)
        .filter_map(|captures| captures.get(1))
        .map(|m| {
            // The value is a JSON string literal, escapes included
            serde_json::from_str::<String>(&format!("\"{}\"", m.as_str()))
                .unwrap_or_else(|_| m.as_str().to_string())
        })
        .map(|alias| alias.replace('_', " ").trim().to_string())
        .filter(|alias| !alias.is_empty())
        .collect()
}
