//! Sites and endpoints documents
//!
//! Defines the data structures for deserializing the YAML documents and
//! loads a whole suite up front, so a broken document stops the run
//! before any request is sent.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::paths::resolve_relative;
use crate::common::{Error, Result};
use crate::http::Method;

use super::variables::Value;

/// One entry in the sites document
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct SiteEntry {
    /// Host (and optional port) under test
    pub domain: String,
    /// Use https instead of http
    #[serde(default)]
    pub secure: bool,
    /// Keep cookies between this site's requests
    #[serde(default)]
    pub session: bool,
    /// Initial variable values
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// Path to the endpoints document, relative to the sites document
    pub endpoints: PathBuf,
    /// Request timeout for this site, overriding the global setting
    pub timeout_secs: Option<u64>,
}

/// A single request definition in an endpoints document
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Endpoint {
    /// Path appended to the site's base URL; may contain placeholders
    pub url: String,
    /// HTTP verb (default: get)
    #[serde(default)]
    pub method: Method,
    /// Request options
    #[serde(default)]
    pub options: EndpointOptions,
    /// Request body
    pub data: Option<RequestData>,
    /// Values to capture from the response, in order
    pub capture: Option<Vec<CaptureDirective>>,
    /// Checks the response must pass
    pub expected: Option<Expectation>,
}

/// Request options
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct EndpointOptions {
    /// Follow redirects (default: false)
    #[serde(default)]
    pub allow_redirects: bool,
}

/// Request body definition
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct RequestData {
    /// Body template; may contain placeholders
    pub body: Option<String>,
    /// How the body is sent (default: form)
    #[serde(default)]
    pub mode: DataMode,
}

/// How a request body is sent
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// Body is a JSON object sent as URL-encoded form fields
    #[default]
    Form,
    /// Body is sent as-is
    Raw,
}

/// A value to extract from a response
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct CaptureDirective {
    /// How the response is queried (default: html)
    #[serde(default)]
    pub mode: CaptureMode,
    /// Variable name; unnamed captures get a generated name
    pub name: Option<String>,
    /// XPath expression evaluated against the response
    pub path: String,
}

/// Capture query language
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// XPath over the response parsed as HTML
    #[default]
    Html,
}

/// Checks applied to a response
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Exact status code
    pub code: Option<u16>,
    /// Regular expression that must match somewhere in the body
    pub contains: Option<BodyPattern>,
    /// Token that must appear in the content-encoding header
    pub encoding: Option<String>,
    /// Format the body must parse as (only "json" is supported)
    pub validate_format: Option<String>,
    /// Regular expression that must match the start of the final URL
    pub url: Option<UrlPattern>,
    /// Skip the site's remaining endpoints if this one fails
    #[serde(default)]
    pub stop_on_fail: bool,
}

/// Regular expression searched for anywhere in a response body
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct BodyPattern {
    source: String,
    regex: regex::bytes::Regex,
}

impl BodyPattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: regex::bytes::Regex::new(source)?,
        })
    }

    /// Whether the pattern occurs anywhere in `haystack`
    pub fn is_found_in(&self, haystack: &[u8]) -> bool {
        self.regex.is_match(haystack)
    }
}

impl TryFrom<String> for BodyPattern {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(&value).map_err(|e| format!("invalid 'contains' pattern: {e}"))
    }
}

impl fmt::Display for BodyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Regular expression matched against the start of a URL
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct UrlPattern {
    source: String,
    regex: regex::Regex,
}

impl UrlPattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: regex::Regex::new(&format!("^(?:{source})"))?,
        })
    }

    /// Whether the pattern matches at the start of `url`
    pub fn matches_start_of(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

impl TryFrom<String> for UrlPattern {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(&value).map_err(|e| format!("invalid 'url' pattern: {e}"))
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A site with its endpoints loaded
#[derive(Debug)]
pub struct Site {
    pub domain: String,
    pub secure: bool,
    pub session: bool,
    pub variables: BTreeMap<String, Value>,
    pub endpoints: Vec<Endpoint>,
    pub timeout_secs: Option<u64>,
}

impl Site {
    /// Scheme and domain, e.g. `https://example.com`
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.domain)
    }
}

/// Every site of a run, in declared order
#[derive(Debug)]
pub struct Suite {
    pub sites: Vec<Site>,
}

impl Suite {
    /// Load the sites document at `path` and every endpoints document it names
    pub fn load(path: &Path) -> Result<Self> {
        let entries: Vec<SiteEntry> = read_yaml(path)?;

        let mut sites = Vec::with_capacity(entries.len());
        for entry in entries {
            let endpoints_path = resolve_relative(path, &entry.endpoints);
            let endpoints: Vec<Endpoint> = read_yaml(&endpoints_path)?;
            tracing::debug!(
                count = endpoints.len(),
                "{} : loaded endpoints from '{}'",
                entry.domain,
                endpoints_path.display()
            );

            sites.push(Site {
                domain: entry.domain,
                secure: entry.secure,
                session: entry.session,
                variables: entry.variables,
                endpoints,
                timeout_secs: entry.timeout_secs,
            });
        }

        Ok(Self { sites })
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| Error::config_parse(path, e))
}
