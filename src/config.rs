use std::path::PathBuf;

use serde::Deserialize;

/// Host tuning knobs.
///
/// Every field has a default, so an empty file (or `HostConfig::default()`)
/// is a valid configuration. The concurrency and timeout knobs are off
/// by default: the bridge imposes no bound on in-flight capability calls
/// and lets a hung call hang its one response indefinitely unless told
/// otherwise.
#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    /// Depth of each message port.
    #[serde(default = "default_port_capacity")]
    pub port_capacity: usize,
    /// Maximum number of capability calls executing at once.
    #[serde(default)]
    pub max_in_flight: Option<usize>,
    /// Per-call timeout in seconds. When it elapses, the guest gets an
    /// ETIMEDOUT error response; other in-flight calls are unaffected.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Working directory applied once at startup, never changed again.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Home directory used for `~` expansion. Defaults to the invoking
    /// user's home.
    #[serde(default)]
    pub home: Option<PathBuf>,
}

fn default_port_capacity() -> usize {
    100
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port_capacity: default_port_capacity(),
            max_in_flight: None,
            request_timeout_secs: None,
            working_dir: None,
            home: None,
        }
    }
}

impl HostConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Expand environment variables like ${PORTICO_HOME}
        let expanded = shellexpand::env(&content)?;
        let config: HostConfig = toml::from_str(&expanded)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.port_capacity, 100);
        assert_eq!(config.max_in_flight, None);
        assert_eq!(config.request_timeout_secs, None);
        assert_eq!(config.working_dir, None);
        assert_eq!(config.home, None);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert_eq!(config.port_capacity, 100);
        assert_eq!(config.max_in_flight, None);
    }

    #[test]
    fn test_load_explicit_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "port_capacity = 8\nmax_in_flight = 4\nrequest_timeout_secs = 30"
        )
        .unwrap();

        let config = HostConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.port_capacity, 8);
        assert_eq!(config.max_in_flight, Some(4));
        assert_eq!(config.request_timeout_secs, Some(30));
    }

    #[test]
    fn test_load_expands_env_vars() {
        std::env::set_var("PORTICO_TEST_HOME", "/srv/guest-home");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "home = \"${PORTICO_TEST_HOME}\"").unwrap();

        let config = HostConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.home, Some(PathBuf::from("/srv/guest-home")));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(HostConfig::load("/nonexistent/host.toml").is_err());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "port_capacity = \"not a number\"").unwrap();
        assert!(HostConfig::load(path.to_str().unwrap()).is_err());
    }
}
