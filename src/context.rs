//! The snapshot of process-global state the bridge is allowed to consult.

use std::path::{Path, PathBuf};

use crate::config::HostConfig;

/// Built once at shell startup and passed by reference from then on.
/// Request handling never reads ambient globals: the home directory used
/// for `~` expansion is whatever this context captured.
#[derive(Debug, Clone)]
pub struct HostContext {
    /// Resolved home directory, if one exists.
    home: Option<String>,
    /// Working directory at startup, after any configured change.
    cwd: PathBuf,
}

impl HostContext {
    /// Detects the context from the environment, honoring config overrides.
    pub fn detect(config: &HostConfig) -> anyhow::Result<Self> {
        let home = config
            .home
            .clone()
            .or_else(dirs::home_dir)
            .map(|p| p.to_string_lossy().into_owned());
        Ok(Self {
            home,
            cwd: std::env::current_dir()?,
        })
    }

    /// Builds a context with an explicit home, for hermetic hosts.
    pub fn with_home(home: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
            cwd: cwd.into(),
        }
    }

    /// Rewrites a leading `~` to the home directory.
    ///
    /// Anything not starting with `~` comes back byte-for-byte, so
    /// resolving twice is the same as resolving once.
    pub fn resolve_path(&self, raw: &str) -> String {
        shellexpand::tilde_with_context(raw, || self.home.as_deref()).into_owned()
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}
