use crate::config::SessionConfig;
use crate::url::{host_of, normalize_url};

/// How far a session may wander from its seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeMode {
    /// Only URLs that start with the seed URL
    PathBound,
    /// Only URLs on the seed's host
    HostBound,
    /// Anything
    Unrestricted,
}

impl ScopeMode {
    /// Selects the mode from the session flags
    ///
    /// `preserve_path` wins over `follow`.
    pub fn from_flags(follow: bool, preserve_path: bool) -> Self {
        if preserve_path {
            Self::PathBound
        } else if !follow {
            Self::HostBound
        } else {
            Self::Unrestricted
        }
    }
}

/// Decides whether a discovered URL may enter the frontier
///
/// The same policy applies to links extracted from a page and to the final
/// URL of a redirect chain.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    seed: String,
    seed_host: Option<String>,
    mode: ScopeMode,
}

impl ScopePolicy {
    /// Creates a policy anchored on a seed URL
    pub fn new(seed: &str, follow: bool, preserve_path: bool) -> Self {
        let seed = normalize_url(seed);
        let seed_host = host_of(&seed);

        Self {
            seed,
            seed_host,
            mode: ScopeMode::from_flags(follow, preserve_path),
        }
    }

    /// Creates the policy for a session configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.seed, config.follow, config.preserve_path)
    }

    /// The active scope mode
    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Returns true if the candidate URL is in scope
    ///
    /// # Policy
    ///
    /// | Mode | Admits |
    /// |------|--------|
    /// | PathBound | normalized candidate has the seed as a literal prefix |
    /// | HostBound | candidate host equals the seed host |
    /// | Unrestricted | everything |
    ///
    /// # Examples
    ///
    /// ```
    /// use creeper::url::ScopePolicy;
    ///
    /// let scope = ScopePolicy::new("https://example.com/docs", false, true);
    /// assert!(scope.admits("https://example.com/docs/intro"));
    /// assert!(!scope.admits("https://example.com/blog"));
    /// ```
    pub fn admits(&self, candidate: &str) -> bool {
        match self.mode {
            ScopeMode::PathBound => normalize_url(candidate).starts_with(&self.seed),
            ScopeMode::HostBound => match (&self.seed_host, host_of(candidate)) {
                (Some(seed_host), Some(host)) => *seed_host == host,
                _ => false,
            },
            ScopeMode::Unrestricted => true,
        }
    }
}
