//! Error types for the smoke test runner
//!
//! Configuration errors name the file and field at fault so a broken
//! suite can be fixed without guessing. Transport errors carry the site
//! domain and URL; the site runner turns them into endpoint failures.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the smoke test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Failed to read '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Invalid configuration in '{path}': {message}")]
    ConfigParse { path: String, message: String },

    // === Request Errors ===
    #[error("{domain} : request to '{url}' failed: {source}")]
    Transport {
        domain: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{domain} : cannot build request body for '{url}': {reason}")]
    RequestBody {
        domain: String,
        url: String,
        reason: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl Error {
    /// Create a file read error for `path`
    pub fn file_read(path: &Path, error: io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a parse error for the document at `path`
    pub fn config_parse(path: &Path, message: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a transport error attributed to a site and URL
    pub fn transport(domain: &str, url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            domain: domain.to_string(),
            url: url.to_string(),
            source,
        }
    }

    /// Create a request body error attributed to a site and URL
    pub fn request_body(domain: &str, url: &str, reason: impl ToString) -> Self {
        Self::RequestBody {
            domain: domain.to_string(),
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the suite cannot start at all
    pub fn is_config(&self) -> bool {
        matches!(self, Error::FileRead { .. } | Error::ConfigParse { .. })
    }
}
