//! Plain-text extraction and link bookkeeping shared by both page formats

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Node};
use std::collections::HashSet;

/// Elements dropped together with everything inside them
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "table", "sup", "nav", "noscript", "link", "meta", "head", "footer",
];

/// Navigation, sidebar and metadata blocks
const EXCLUDED_CLASSES: &[&str] = &[
    "mw-editsection",
    "navbox",
    "vertical-navbox",
    "sidebar",
    "infobox",
    "metadata",
    "reflist",
    "references",
    "hatnote",
    "catlinks",
    "printfooter",
    "toc",
    "mw-jump-link",
    "noprint",
    "thumbcaption",
    "shortdescription",
];

const EXCLUDED_IDS: &[&str] = &["toc", "catlinks", "mw-navigation", "footer", "siteSub", "jump-to-nav"];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static EDIT_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*edit\s*\]").unwrap());
static FOOTNOTE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

/// Extracts cleaned plain text below `root`
pub fn extract_text(root: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(root, &mut raw);
    clean_text(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    if is_excluded(element.value()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

/// Returns true if the element holds no article prose
pub fn is_excluded(element: &Element) -> bool {
    if EXCLUDED_TAGS.contains(&element.name()) {
        return true;
    }

    if element
        .id()
        .map(|id| EXCLUDED_IDS.contains(&id))
        .unwrap_or(false)
    {
        return true;
    }

    element.classes().any(|class| EXCLUDED_CLASSES.contains(&class))
}

/// Collapses whitespace and strips `[edit]` and `[12]` style markers
pub fn clean_text(text: &str) -> String {
    let text = WHITESPACE.replace_all(text, " ");
    let text = EDIT_MARKER.replace_all(&text, "");
    let text = FOOTNOTE_MARKER.replace_all(&text, "");
    // Marker removal can leave double spaces behind
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Ordered set of link titles, unique case-insensitively
///
/// The first-seen spelling of a title is the one kept.
#[derive(Debug, Default)]
pub struct LinkSet {
    links: Vec<String>,
    seen: HashSet<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a title; returns false if an equivalent title was already present
    pub fn insert(&mut self, title: String) -> bool {
        let title = title.trim().to_string();
        if title.is_empty() {
            return false;
        }

        if self.seen.insert(title.to_lowercase()) {
            self.links.push(title);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.links
    }
}
