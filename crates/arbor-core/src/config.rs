//! Registry configuration.

use arbor_governance::QuorumRule;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Approval rule given to every node constructed by the registry
    pub quorum: QuorumRule,

    /// Longest accepted path, member included
    pub max_path_len: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RegistryConfig {
    pub const DEFAULT_MAX_PATH_LEN: usize = 16;

    /// Built-in defaults, ignoring the environment.
    pub fn new() -> Self {
        Self {
            quorum: QuorumRule::default(),
            max_path_len: Self::DEFAULT_MAX_PATH_LEN,
        }
    }

    /// Create config from environment variables with sensible defaults.
    ///
    /// - `ARBOR_QUORUM`: `any`, `majority` or `fixed:<votes>`
    /// - `ARBOR_MAX_PATH_LEN`: at least 2
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// Unparseable values are logged and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();

        if let Some(raw) = lookup("ARBOR_QUORUM") {
            match raw.parse() {
                Ok(quorum) => config.quorum = quorum,
                Err(e) => tracing::warn!("Ignoring ARBOR_QUORUM: {}", e),
            }
        }

        if let Some(raw) = lookup("ARBOR_MAX_PATH_LEN") {
            match raw.trim().parse::<usize>() {
                Ok(len) if len >= 2 => config.max_path_len = len,
                _ => tracing::warn!(
                    "Ignoring ARBOR_MAX_PATH_LEN={:?}, using {}",
                    raw,
                    config.max_path_len
                ),
            }
        }

        config
    }

    pub fn with_quorum(mut self, quorum: QuorumRule) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len.max(2);
        self
    }
}
