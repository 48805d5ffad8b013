use crate::config::types::SessionConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and validates a session configuration
///
/// # Arguments
///
/// * `path` - Path to the session's `config.json`
///
/// # Returns
///
/// * `Ok(SessionConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to read, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use creeper::config::load_config;
///
/// let config = load_config(Path::new("x.test/config.json")).unwrap();
/// println!("Seed: {}", config.seed);
/// ```
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: SessionConfig = serde_json::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Validates and writes a session configuration
///
/// The file is written once, when the session is created.
pub fn save_config(path: &Path, config: &SessionConfig) -> Result<(), ConfigError> {
    validate(config)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hex::encode(Sha256::digest(content.as_bytes())))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(SessionConfig, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
