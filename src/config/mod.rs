//! Session configuration
//!
//! A session's settings are captured in `config.json` inside the session
//! directory when the crawl starts and read back when it resumes.
//!
//! # Example
//!
//! ```no_run
//! use creeper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("x.test/config.json")).unwrap();
//! println!("Resuming crawl of {}", config.seed);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{DownloadFlags, SessionConfig, DEFAULT_RENDER_ENDPOINT};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, save_config};
pub use validation::{validate, validate_seed};
