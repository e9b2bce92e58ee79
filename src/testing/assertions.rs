//! Response checks
//!
//! Each check returns `Ok(())` or a diagnostic naming the expected and
//! actual values. [`evaluate`] runs every check an expectation enables,
//! even after one fails, so every reason is reported.

use std::fmt;

use crate::http::{Exchange, HttpResponse};

use super::config::{BodyPattern, Expectation, UrlPattern};

/// Outcome of a single check
pub type CheckResult = std::result::Result<(), String>;

/// The checks an expectation can enable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Code,
    Contains,
    Encoding,
    Format,
    Url,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckKind::Code => "code",
            CheckKind::Contains => "contains",
            CheckKind::Encoding => "encoding",
            CheckKind::Format => "validate_format",
            CheckKind::Url => "url",
        })
    }
}

/// A failed check and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub check: CheckKind,
    pub message: String,
}

/// Result of evaluating one endpoint's expectation
#[derive(Debug, Clone, Default)]
pub struct Verdict {
    /// Number of checks that ran
    pub checks_run: usize,
    /// Checks that failed, in evaluation order
    pub failures: Vec<CheckFailure>,
}

impl Verdict {
    fn record(&mut self, check: CheckKind, result: CheckResult) {
        self.checks_run += 1;
        if let Err(message) = result {
            self.failures.push(CheckFailure { check, message });
        }
    }
}

/// Status code must equal `expected`
pub fn check_code(response: &HttpResponse, expected: u16) -> CheckResult {
    if response.status == expected {
        Ok(())
    } else {
        Err(format!(
            "response code mismatch [e: {} || got: {}]",
            expected, response.status
        ))
    }
}

/// `pattern` must match somewhere in the body
pub fn check_contains(response: &HttpResponse, pattern: &BodyPattern) -> CheckResult {
    if pattern.is_found_in(&response.body) {
        Ok(())
    } else {
        Err(format!("object not in response body [e: {}]", pattern))
    }
}

/// The content-encoding header must exist and mention `expected`
pub fn check_encoding(response: &HttpResponse, expected: &str) -> CheckResult {
    let Some(actual) = response.header("content-encoding") else {
        return Err("missing header [e: content-encoding]".to_string());
    };
    if actual.to_lowercase().contains(&expected.to_lowercase()) {
        Ok(())
    } else {
        Err(format!(
            "content encoding mismatch [e: {} || got: {}]",
            expected, actual
        ))
    }
}

/// The body must parse as `format`; only JSON is supported
pub fn check_format(response: &HttpResponse, format: &str) -> CheckResult {
    if !format.eq_ignore_ascii_case("json") {
        return Err(format!("cannot test for '{}'", format));
    }
    serde_json::from_slice::<serde_json::Value>(&response.body)
        .map(|_| ())
        .map_err(|e| format!("invalid format [e: json] ({})", e))
}

/// `pattern` must match the start of the final URL
pub fn check_url(response: &HttpResponse, pattern: &UrlPattern) -> CheckResult {
    if pattern.matches_start_of(&response.url) {
        Ok(())
    } else {
        Err(format!(
            "url mismatch [e: /{}/ || got: '{}']",
            pattern, response.url
        ))
    }
}

/// Run every check `expected` enables against one response
pub fn evaluate(exchange: &Exchange<'_>, expected: &Expectation) -> Verdict {
    let domain = exchange.domain;
    let response = exchange.response;
    let mut verdict = Verdict::default();
    tracing::debug!("{} : checking {} '{}'", domain, exchange.method, exchange.url);

    if let Some(code) = expected.code {
        tracing::debug!("{} : test expected response code", domain);
        verdict.record(CheckKind::Code, check_code(response, code));
    }
    if let Some(pattern) = &expected.contains {
        tracing::debug!("{} : test expected response body", domain);
        verdict.record(CheckKind::Contains, check_contains(response, pattern));
    }
    if let Some(encoding) = &expected.encoding {
        tracing::debug!("{} : test expected response encoding", domain);
        verdict.record(CheckKind::Encoding, check_encoding(response, encoding));
    }
    if let Some(format) = &expected.validate_format {
        tracing::debug!("{} : test response format", domain);
        if !format.eq_ignore_ascii_case("json") {
            tracing::warn!("{} : cannot test for '{}'", domain, format);
        }
        verdict.record(CheckKind::Format, check_format(response, format));
    }
    if let Some(pattern) = &expected.url {
        tracing::debug!("{} : test expected response url", domain);
        verdict.record(CheckKind::Url, check_url(response, pattern));
    }

    verdict
}
