//! Creeper main entry point
//!
//! This is the command-line interface for the Creeper crawler.

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use creeper::config::{
    validate, validate_seed, DownloadFlags, SessionConfig, DEFAULT_RENDER_ENDPOINT,
};
use creeper::crawler::run_crawl;
use creeper::output::{load_statistics, print_statistics};
use creeper::storage::SessionDirectory;
use creeper::{ConfigError, Session};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Highest meaningful `-v` count; more is accepted and means the same
const MAX_VERBOSITY: u8 = 3;

/// Creeper: a resumable single-host web crawler
///
/// Creeper crawls a site from a seed URL, skips pages whose text it has
/// already seen, optionally downloads linked documents and media, and keeps
/// its state in a session directory so an interrupted crawl can be resumed.
#[derive(Parser, Debug)]
#[command(name = "creeper")]
#[command(version = "1.0.0")]
#[command(about = "A resumable single-host web crawler", long_about = None)]
struct Cli {
    /// Seed URL, or the directory of a session to resume
    #[arg(value_name = "TARGET")]
    target: String,

    /// Follow links outside the seed's host
    #[arg(short, long)]
    follow: bool,

    /// Only follow links below the seed URL
    #[arg(short, long)]
    preserve_path: bool,

    /// Download documents (pdf, doc, ...)
    #[arg(short = 'g', long)]
    documents: bool,

    /// Download images
    #[arg(short, long)]
    images: bool,

    /// Download audio files
    #[arg(long)]
    audio: bool,

    /// Download video files
    #[arg(long)]
    video: bool,

    /// Download every recognized file type
    #[arg(short, long)]
    all_files: bool,

    /// Render pages through a prerender service before parsing
    #[arg(short, long)]
    dynamic: bool,

    /// Address of the rendering service
    #[arg(long, value_name = "URL", requires = "dynamic")]
    render_endpoint: Option<String>,

    /// Index results into Elasticsearch at http(s)://host:port
    #[arg(short = 'e', long, value_name = "URL")]
    index_endpoint: Option<String>,

    /// Discard existing crawl state in the output directory
    #[arg(short, long)]
    clear: bool,

    /// Session directory (default: ./<seed host>)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show statistics for the session and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let message = error_message(&e);
            tracing::error!("{}", message);
            eprintln!("creeper: {}", message);
            ExitCode::from(1)
        }
    }
}

/// The crate's error types already render their sources inline
fn error_message(error: &anyhow::Error) -> String {
    error.to_string()
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let target = Path::new(&cli.target);

    if cli.stats {
        handle_stats(&cli)?;
        return Ok(0);
    }

    let (dir, session) = if SessionDirectory::is_session(target) {
        resume_session(&cli, target)?
    } else {
        new_session(&cli)?
    };

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_interrupt_handler(Arc::clone(&cancel));

    let outcome = run_crawl(session, dir, cancel).await?;
    Ok(outcome.exit_code())
}

/// Sets up logging to stderr and the session log
fn setup_logging(verbosity: u8, quiet: bool, log_path: &Path) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbosity {
            0 => EnvFilter::new("creeper=info,warn"),
            1 => EnvFilter::new("creeper=debug,info"),
            2 => EnvFilter::new("creeper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| anyhow!("failed to open log file {}: {}", log_path.display(), e))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_ansi(false)
        .with_writer(std::io::stderr.and(Mutex::new(log_file)))
        .init();

    Ok(())
}

/// Reopens an existing session; only verbosity may be overridden
fn resume_session(cli: &Cli, target: &Path) -> anyhow::Result<(SessionDirectory, Session)> {
    let (dir, mut config) = SessionDirectory::open(target)?;

    if cli.verbose > 0 {
        config.verbosity = cli.verbose.min(MAX_VERBOSITY);
    }

    setup_logging(config.verbosity, cli.quiet, &dir.log_path())?;
    tracing::info!("Resuming session in {}", dir.root().display());

    let session = dir.load_session(config)?;
    Ok((dir, session))
}

/// Creates a session for a seed URL
fn new_session(cli: &Cli) -> anyhow::Result<(SessionDirectory, Session)> {
    if let Err(e) = validate_seed(&cli.target) {
        if Path::new(&cli.target).is_dir() {
            bail!(ConfigError::SessionNotFound(cli.target.clone()));
        }
        return Err(e.into());
    }

    let output_dir = match &cli.output {
        Some(dir) => dir.clone(),
        None => SessionConfig::default_output_dir(&cli.target)
            .with_context(|| format!("cannot derive an output directory from {}", cli.target))?,
    };

    if SessionDirectory::is_session(&output_dir) && !cli.clear {
        bail!(ConfigError::SessionExists(output_dir.display().to_string()));
    }

    let config = session_config(cli, output_dir);

    // Nothing is cleared unless the replacement config is valid
    validate(&config)?;

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| anyhow!("failed to create {}: {}", config.output_dir.display(), e))?;

    let existing = SessionDirectory::new(&config.output_dir);
    setup_logging(config.verbosity, cli.quiet, &existing.log_path())?;

    if cli.clear {
        existing.clear()?;
    }

    let dir = SessionDirectory::create(&config)?;
    Ok((dir, Session::new(config)))
}

/// Builds the configuration of a new session from the command line
fn session_config(cli: &Cli, output_dir: PathBuf) -> SessionConfig {
    let mut config = SessionConfig::new(cli.target.clone(), output_dir);
    config.follow = cli.follow;
    config.preserve_path = cli.preserve_path;
    config.downloads = DownloadFlags {
        documents: cli.documents,
        images: cli.images,
        audio: cli.audio,
        video: cli.video,
    };
    config.all_files = cli.all_files;
    config.dynamic = cli.dynamic;
    config.render_endpoint = match (&cli.render_endpoint, cli.dynamic) {
        (Some(endpoint), _) => Some(endpoint.clone()),
        (None, true) => Some(DEFAULT_RENDER_ENDPOINT.to_string()),
        (None, false) => None,
    };
    config.index_endpoint = cli.index_endpoint.clone();
    config.verbosity = cli.verbose.min(MAX_VERBOSITY);
    config
}

/// Handles --stats: prints statistics for an existing session
fn handle_stats(cli: &Cli) -> anyhow::Result<()> {
    let target = Path::new(&cli.target);

    let root = if SessionDirectory::is_session(target) {
        target.to_path_buf()
    } else {
        match &cli.output {
            Some(dir) => dir.clone(),
            None => SessionConfig::default_output_dir(&cli.target)
                .ok_or_else(|| ConfigError::SessionNotFound(cli.target.clone()))?,
        }
    };

    let (dir, config) = SessionDirectory::open(&root)?;
    let stats = load_statistics(&dir)?;

    println!("Session: {} ({})\n", dir.root().display(), config.seed);
    print_statistics(&stats);
    Ok(())
}

/// Raises the cancellation flag on Ctrl-C; the crawl drains between URLs
fn spawn_interrupt_handler(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, saving state...");
            cancel.store(true, Ordering::SeqCst);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use creeper::storage::layout::{CONFIG_FILE, VISITED_FILE};

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("creeper").chain(args.iter().copied()))
    }

    #[test]
    fn test_verbosity_is_clamped() {
        let config = session_config(&cli(&["http://x.test/a", "-vvvvv"]), "/tmp/x".into());
        assert_eq!(config.verbosity, MAX_VERBOSITY);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_dynamic_gets_default_render_endpoint() {
        let config = session_config(&cli(&["http://x.test/a", "-d"]), "/tmp/x".into());
        assert_eq!(config.render_endpoint.as_deref(), Some(DEFAULT_RENDER_ENDPOINT));
    }

    #[test]
    fn test_invalid_clear_keeps_existing_session() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("x.test");

        let existing = SessionConfig::new("http://x.test/a", &root);
        let dir = SessionDirectory::create(&existing).unwrap();
        std::fs::write(dir.path(VISITED_FILE), "").unwrap();

        let args = cli(&[
            "http://x.test/a",
            "-o",
            root.to_str().unwrap(),
            "-c",
            "-e",
            "http://localhost",
        ]);
        assert!(new_session(&args).is_err());

        assert!(dir.path(CONFIG_FILE).exists());
        assert!(dir.path(VISITED_FILE).exists());
    }

    #[test]
    fn test_config_error_reported_once() {
        let err: anyhow::Error = creeper::CreeperError::from(creeper::ConfigError::Validation(
            "verbosity too high".to_string(),
        ))
        .into();

        let message = error_message(&err);
        assert_eq!(message, "Configuration error: Validation error: verbosity too high");
        assert_eq!(message.matches("verbosity too high").count(), 1);
    }
}
