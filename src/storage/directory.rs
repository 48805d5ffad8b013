//! File-backed session directory

use crate::config::{load_config_with_hash, save_config, SessionConfig};
use crate::output::CrawlResult;
use crate::state::{Frontier, Session};
use crate::storage::layout::{
    format_visited_line, parse_visited_line, BUFFER_FILE, CONFIG_FILE, LOG_FILE, RESULTS_FILE,
    STATE_FILES, UNVISITED_FILE, VISITED_FILE,
};
use crate::storage::{Storage, StorageError, StorageResult};
use crate::{ConfigError, CrawlError, CreeperError};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A session directory on disk
#[derive(Debug, Clone)]
pub struct SessionDirectory {
    root: PathBuf,
}

impl SessionDirectory {
    /// Wraps a directory without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns true if `dir` holds a session
    pub fn is_session(dir: &Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    /// Creates a new session directory and writes its configuration
    ///
    /// Fails with `SessionExists` if the directory already holds a session.
    pub fn create(config: &SessionConfig) -> Result<Self, CreeperError> {
        let dir = Self::new(&config.output_dir);

        if Self::is_session(&dir.root) {
            return Err(ConfigError::SessionExists(dir.root.display().to_string()).into());
        }

        fs::create_dir_all(&dir.root)?;
        save_config(&dir.config_path(), config)?;

        tracing::info!("Created session in {}", dir.root.display());
        Ok(dir)
    }

    /// Opens an existing session directory and loads its configuration
    pub fn open(root: impl Into<PathBuf>) -> Result<(Self, SessionConfig), CreeperError> {
        let dir = Self::new(root);

        if !Self::is_session(&dir.root) {
            return Err(ConfigError::SessionNotFound(dir.root.display().to_string()).into());
        }

        let (config, hash) = load_config_with_hash(&dir.config_path())?;
        tracing::debug!("Loaded session config (sha256 {})", hash);

        Ok((dir, config))
    }

    /// Removes crawl-state files, keeping downloads and the log
    pub fn clear(&self) -> StorageResult<()> {
        for name in STATE_FILES {
            remove_if_exists(&self.path(name))?;
        }
        tracing::info!("Cleared session state in {}", self.root.display());
        Ok(())
    }

    /// Loads config-independent state and rebuilds the session
    pub fn load_session(&self, config: SessionConfig) -> StorageResult<Session> {
        let frontier = self.load_frontier()?;
        let results = self.load_results()?;

        tracing::info!(
            "Resumed session: {} visited, {} unvisited, {} results",
            frontier.visited_len(),
            frontier.unvisited_len(),
            results.len()
        );

        Ok(Session::restore(config, frontier, results))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path(CONFIG_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.path(LOG_FILE)
    }
}

impl Storage for SessionDirectory {
    fn load_frontier(&self) -> StorageResult<Frontier> {
        let visited_path = self.path(VISITED_FILE);
        let mut visited = Vec::new();

        for (index, line) in read_lines(&visited_path)?.into_iter().enumerate() {
            let Some(entry) = parse_visited_line(&line) else {
                return Err(StorageError::CorruptLine {
                    file: visited_path.display().to_string(),
                    line: index + 1,
                });
            };
            visited.push(entry);
        }

        let unvisited = read_lines(&self.path(UNVISITED_FILE))?;

        Ok(Frontier::from_parts(visited, unvisited))
    }

    fn save_frontier(&mut self, frontier: &Frontier) -> StorageResult<()> {
        let visited: String = frontier
            .visited()
            .map(|(url, mark)| format_visited_line(url, mark) + "\n")
            .collect();
        write_atomic(&self.path(VISITED_FILE), visited.as_bytes())?;

        let unvisited: String = frontier.unvisited().map(|url| format!("{}\n", url)).collect();
        write_atomic(&self.path(UNVISITED_FILE), unvisited.as_bytes())?;

        tracing::trace!(
            "Saved frontier ({} visited, {} unvisited)",
            frontier.visited_len(),
            frontier.unvisited_len()
        );
        Ok(())
    }

    fn remove_unvisited(&mut self) -> StorageResult<()> {
        remove_if_exists(&self.path(UNVISITED_FILE))?;
        Ok(())
    }

    fn has_unvisited(&self) -> bool {
        self.path(UNVISITED_FILE).is_file()
    }

    fn append_result(&mut self, result: &CrawlResult) -> StorageResult<()> {
        let line = result.to_line()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(BUFFER_FILE))?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    fn load_results(&self) -> StorageResult<Vec<CrawlResult>> {
        let path = self.path(BUFFER_FILE);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut results = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match CrawlResult::from_line(&line) {
                Ok(result) => results.push(result),
                Err(e) => {
                    let error = CrawlError::BufferParseError {
                        line: index + 1,
                        reason: e.to_string(),
                    };
                    tracing::warn!("{}; record dropped", error);
                }
            }
        }

        Ok(results)
    }

    fn consolidate_results(&mut self, results: &[CrawlResult]) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(results)?;
        write_atomic(&self.path(RESULTS_FILE), &json)?;
        tracing::info!(
            "Consolidated {} results into {}",
            results.len(),
            self.path(RESULTS_FILE).display()
        );
        Ok(())
    }
}

/// Reads non-empty lines; a missing file reads as empty
fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Writes through a temporary file and renames it over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
