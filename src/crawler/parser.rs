//! HTML parser for extracting text, links and resources
//!
//! This module handles parsing HTML content to extract:
//! - The page title and its visible text
//! - The `<base href>` override, if any
//! - Links to follow and resource references to download

use crate::resource::classify;
use crate::state::normalize_text;
use crate::url::resolve_link;
use indexmap::IndexSet;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text is never part of the page text
const HIDDEN_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title, whitespace-collapsed
    pub title: Option<String>,

    /// Visible text, whitespace-collapsed
    pub text: String,

    /// Normalized `<base href>` target
    pub base: Option<String>,

    /// Normalized `<a href>` targets in document order, without repeats
    pub links: Vec<String>,

    /// `<a href>` / `<img src>` targets with a recognized file extension
    pub resources: Vec<String>,
}

/// Parses HTML content and extracts text, links and resources
///
/// Relative references are resolved against `<base href>` when present,
/// otherwise against `page_url`.
///
/// # Example
///
/// ```
/// use creeper::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &page_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let base = extract_base(&document, page_url);
    let resolve_against = base
        .as_deref()
        .and_then(|b| Url::parse(b).ok())
        .unwrap_or_else(|| page_url.clone());

    let links = collect_refs(&document, "a[href]", "href", &resolve_against);

    let mut resources: IndexSet<String> = links
        .iter()
        .filter(|link| classify(link).is_some())
        .cloned()
        .collect();
    resources.extend(
        collect_refs(&document, "img[src]", "src", &resolve_against)
            .into_iter()
            .filter(|src| classify(src).is_some()),
    );

    ParsedPage {
        title: extract_title(&document),
        text: extract_text(&document),
        base,
        links,
        resources: resources.into_iter().collect(),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| normalize_text(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_base(document: &Html, page_url: &Url) -> Option<String> {
    let base_selector = Selector::parse("base[href]").ok()?;

    document
        .select(&base_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| resolve_link(href, page_url))
}

/// Concatenates every text node outside hidden elements
fn extract_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().filter_map(ElementRef::wrap).any(|element| {
            HIDDEN_TEXT_ELEMENTS.contains(&element.value().name())
        });

        if !hidden {
            text.push_str(fragment);
        }
    }

    normalize_text(&text)
}

/// Resolves the `attr` of every element matching `selector`, without repeats
fn collect_refs(document: &Html, selector: &str, attr: &str, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    let refs: IndexSet<String> = document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .filter_map(|href| resolve_link(href, base_url))
        .collect();

    refs.into_iter().collect()
}
