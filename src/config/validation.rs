use crate::config::types::SessionConfig;
use crate::ConfigError;
use url::Url;

/// Highest supported verbosity level
const MAX_VERBOSITY: u8 = 3;

/// Validates the entire configuration
pub fn validate(config: &SessionConfig) -> Result<(), ConfigError> {
    validate_seed(&config.seed)?;

    if let Some(endpoint) = &config.index_endpoint {
        validate_endpoint("index-endpoint", endpoint, true)?;
    }

    if let Some(endpoint) = &config.render_endpoint {
        validate_endpoint("render-endpoint", endpoint, false)?;
    }

    if config.dynamic && config.render_endpoint.is_none() {
        return Err(ConfigError::Validation(
            "dynamic rendering requires a render-endpoint".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.verbosity > MAX_VERBOSITY {
        return Err(ConfigError::Validation(format!(
            "verbosity must be between 0 and {}, got {}",
            MAX_VERBOSITY, config.verbosity
        )));
    }

    Ok(())
}

/// Validates the seed URL: absolute, HTTP(S), with a host
pub fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates a collaborator endpoint
///
/// The index endpoint must name its port explicitly (`http://host:9200`).
fn validate_endpoint(name: &str, endpoint: &str, require_port: bool) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, endpoint, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            name, endpoint
        )));
    }

    if require_port && url.port().is_none() && !has_explicit_default_port(endpoint) {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must include a port (e.g. http://localhost:9200)",
            name, endpoint
        )));
    }

    Ok(())
}

/// The URL parser drops a port equal to the scheme default; look at the raw
/// authority instead
fn has_explicit_default_port(endpoint: &str) -> bool {
    endpoint
        .split_once("://")
        .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or_default())
        .and_then(|authority| authority.rsplit_once(':'))
        .map_or(false, |(_, port)| {
            !port.is_empty() && port.len() <= 5 && port.chars().all(|c| c.is_ascii_digit())
        })
}
