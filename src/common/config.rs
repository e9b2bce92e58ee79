//! Settings file handling
//!
//! Settings are optional; every field has a default so a missing file or a
//! partial file behaves the same as an empty one.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main settings structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP client settings
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds (0 disables it)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds (0 disables it)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum redirects followed when an endpoint allows redirects
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!("smoketest/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_redirects() -> usize {
    10
}

impl HttpConfig {
    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeout_secs)
    }

    /// Connect timeout, `None` when disabled
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.connect_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl Config {
    /// Load settings from an explicit file, or the default location
    ///
    /// An explicit path must exist. The default location is optional and
    /// yields default settings when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load settings from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        toml::from_str(&content).map_err(|e| Error::config_parse(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.http.max_redirects, 10);
        assert!(config.http.user_agent.starts_with("smoketest/"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str("[http]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.http.timeout(), None);
        assert_eq!(config.http.connect_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/smoketest.toml"))).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_bad_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\ntimeout_secs = \"soon\"\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("config.toml"));
    }
}
