use url::Url;

/// Extracts the host, with its port, from a URL
///
/// The host is returned lowercase. A port is kept as `host:port` unless it
/// is the scheme default. If the URL has no host (mailto:, data:, ...), it
/// returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use creeper::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com:8443".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?.to_lowercase();

    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Parses a URL string and extracts its host
///
/// Returns None when the string does not parse or carries no host.
pub fn host_of(url_str: &str) -> Option<String> {
    Url::parse(url_str.trim())
        .ok()
        .as_ref()
        .and_then(extract_host)
}
