use url::Url;

/// Normalizes a URL string into the identity key used by the frontier
///
/// # Normalization Steps
///
/// 1. Parse the URL (scheme and host are lowercased by the parser)
/// 2. Keep scheme, host and port; drop any user info
/// 3. Collapse runs of `/` in the path into a single separator
/// 4. Re-append the query verbatim after a literal `?` (dropped when empty)
/// 5. Drop the fragment
///
/// Input that cannot be parsed still yields a best-effort string with the
/// same fragment/query/separator treatment. Normalizing an already
/// normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use creeper::url::normalize_url;
///
/// let url = normalize_url("http://Example.COM//docs///intro?b=2&a=1#top");
/// assert_eq!(url, "http://example.com/docs/intro?b=2&a=1");
/// ```
pub fn normalize_url(url_str: &str) -> String {
    let trimmed = url_str.trim();

    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => normalize_parsed(&url),
        Ok(mut url) => {
            // mailto:, data: and friends have no path structure to collapse
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => normalize_unparsed(trimmed),
    }
}

/// Normalizes a URL that parsed successfully and carries a host
fn normalize_parsed(url: &Url) -> String {
    let mut normalized = String::with_capacity(url.as_str().len());

    normalized.push_str(url.scheme());
    normalized.push_str("://");
    normalized.push_str(url.host_str().unwrap_or_default());

    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }

    normalized.push_str(&collapse_separators(url.path()));

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        normalized.push('?');
        normalized.push_str(query);
    }

    normalized
}

/// Best-effort normalization for strings the URL parser rejects
fn normalize_unparsed(raw: &str) -> String {
    let without_fragment = raw.split_once('#').map_or(raw, |(head, _)| head);

    let (base, query) = match without_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_fragment, None),
    };

    let mut normalized = match base.split_once("://") {
        Some((scheme, rest)) => format!("{}://{}", scheme, collapse_separators(rest)),
        None => collapse_separators(base),
    };

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        normalized.push('?');
        normalized.push_str(query);
    }

    normalized
}

/// Collapses consecutive `/` characters into one
fn collapse_separators(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut previous_was_separator = false;

    for c in path.chars() {
        if c == '/' {
            if !previous_was_separator {
                collapsed.push(c);
            }
            previous_was_separator = true;
        } else {
            collapsed.push(c);
            previous_was_separator = false;
        }
    }

    collapsed
}
