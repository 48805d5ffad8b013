//! URL handling module for Creeper
//!
//! This module provides URL normalization, host extraction and the scope
//! policy that decides which discovered URLs may enter the frontier.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{extract_host, host_of};
pub use normalize::normalize_url;
pub use scope::{ScopeMode, ScopePolicy};

use url::Url;

/// Resolves an href against a base URL and normalizes the result
///
/// Returns None if the link should be excluded:
/// - empty hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - fragment-only links (same page anchors)
/// - hrefs that do not resolve to an HTTP(S) URL
///
/// # Examples
///
/// ```
/// use creeper::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("http://x.test/a/page").unwrap();
/// assert_eq!(resolve_link("..//b", &base), Some("http://x.test/b".to_string()));
/// assert_eq!(resolve_link("mailto:me@x.test", &base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    Some(normalize_url(absolute.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/dir/page").unwrap()
    }

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(
            resolve_link("https://other.com/page", &base_url()),
            Some("https://other.com/page".to_string())
        );
    }

    #[test]
    fn test_resolve_root_relative() {
        assert_eq!(
            resolve_link("/other", &base_url()),
            Some("https://example.com/other".to_string())
        );
    }

    #[test]
    fn test_resolve_path_relative() {
        assert_eq!(
            resolve_link("sibling", &base_url()),
            Some("https://example.com/dir/sibling".to_string())
        );
    }

    #[test]
    fn test_resolve_strips_fragment_and_collapses() {
        assert_eq!(
            resolve_link("/a//b#section", &base_url()),
            Some("https://example.com/a/b".to_string())
        );
    }

    #[test]
    fn test_skip_special_schemes() {
        for href in [
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:test@example.com",
            "tel:+1234567890",
            "data:text/html,<h1>x</h1>",
        ] {
            assert_eq!(resolve_link(href, &base_url()), None, "{}", href);
        }
    }

    #[test]
    fn test_skip_fragment_only_and_empty() {
        assert_eq!(resolve_link("#section", &base_url()), None);
        assert_eq!(resolve_link("   ", &base_url()), None);
    }

    #[test]
    fn test_skip_non_http() {
        assert_eq!(resolve_link("ftp://example.com/file", &base_url()), None);
    }
}
