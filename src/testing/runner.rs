//! Site and suite runners
//!
//! A [`SiteRunner`] walks one site's endpoints in order. For each one it
//! builds the request, sends it, runs captures, then evaluates the
//! expectation. Failures are counted per endpoint; a failing endpoint
//! with `stop_on_fail` ends the site early. [`run_suite`] runs every site
//! in declared order, each with a fresh store and session.

use colored::Colorize;

use crate::common::config::HttpConfig;
use crate::common::logging::FINAL_TARGET;
use crate::common::{Error, Result};
use crate::http::{form_fields, Exchange, Method, Payload, Request, Session};

use super::assertions::{evaluate, CheckKind};
use super::capture::{run_captures, CaptureOutcome};
use super::config::{DataMode, Endpoint, Site, Suite};
use super::variables::VariableStore;

/// Result of running one endpoint
#[derive(Debug)]
pub struct EndpointResult {
    pub method: Method,
    /// Requested URL, after substitution
    pub url: String,
    /// Why the endpoint failed; empty when it passed
    pub failures: Vec<String>,
    /// Checks that failed, in evaluation order; empty for transport and
    /// body errors
    pub failed_checks: Vec<CheckKind>,
    /// What each capture directive did
    pub captures: Vec<CaptureOutcome>,
}

impl EndpointResult {
    fn failed(method: Method, url: String, reason: String) -> Self {
        Self {
            method,
            url,
            failures: vec![reason],
            failed_checks: Vec::new(),
            captures: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of running one site
#[derive(Debug)]
pub struct SiteResult {
    pub domain: String,
    /// Number of failing endpoints
    pub errors: usize,
    /// Endpoints defined for the site
    pub endpoints_total: usize,
    /// True when `stop_on_fail` skipped the remaining endpoints
    pub stopped: bool,
    /// Per-endpoint results, for the endpoints that ran
    pub endpoints: Vec<EndpointResult>,
}

impl SiteResult {
    /// True when no endpoint failed
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    /// Number of endpoints that ran
    pub fn endpoints_run(&self) -> usize {
        self.endpoints.len()
    }
}

/// Result of running every site
#[derive(Debug, Default)]
pub struct SuiteResult {
    pub sites: Vec<SiteResult>,
}

impl SuiteResult {
    /// True when every site passed
    pub fn passed(&self) -> bool {
        self.sites.iter().all(SiteResult::passed)
    }

    /// Number of sites that passed
    pub fn sites_passed(&self) -> usize {
        self.sites.iter().filter(|s| s.passed()).count()
    }

    /// Process exit code: 0 when every site passed, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Runs one site's endpoints against its own store and session
pub struct SiteRunner<'a> {
    site: &'a Site,
    base_url: String,
    session: Session,
    store: VariableStore,
}

impl<'a> SiteRunner<'a> {
    /// Create a runner with a fresh session and a store seeded from the
    /// site's variables
    pub fn new(site: &'a Site, http: &HttpConfig) -> Result<Self> {
        let mut http = http.clone();
        if let Some(secs) = site.timeout_secs {
            http.timeout_secs = secs;
        }

        let session = Session::new(&site.domain, site.session, &http)?;
        if session.keeps_cookies() {
            tracing::debug!("{} : cookies kept between requests", site.domain);
        }

        Ok(Self {
            site,
            base_url: site.base_url(),
            session,
            store: VariableStore::seeded(
                site.variables
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            ),
        })
    }

    /// Run every endpoint in order, stopping early only for `stop_on_fail`
    pub async fn run(mut self) -> SiteResult {
        let site = self.site;
        let domain = site.domain.as_str();
        tracing::info!("{} : begin test", domain);

        let mut result = SiteResult {
            domain: site.domain.clone(),
            errors: 0,
            endpoints_total: site.endpoints.len(),
            stopped: false,
            endpoints: Vec::with_capacity(site.endpoints.len()),
        };

        for endpoint in &site.endpoints {
            let outcome = self.run_endpoint(endpoint).await;
            let passed = outcome.passed();

            if passed {
                tracing::debug!("{} : PASS : {}", domain, outcome.url);
            } else {
                for reason in &outcome.failures {
                    tracing::error!("{} : FAIL : {}", domain, reason);
                }
                result.errors += 1;
            }
            result.endpoints.push(outcome);

            let stop_on_fail = endpoint
                .expected
                .as_ref()
                .is_some_and(|expected| expected.stop_on_fail);
            if !passed && stop_on_fail {
                tracing::error!("{} : STOP : cannot continue processing", domain);
                result.stopped = true;
                break;
            }
        }

        if !self.store.is_empty() {
            tracing::debug!("{} : end test with {} variable(s)", domain, self.store.len());
        }
        result
    }

    /// Build, send, capture, assert
    async fn run_endpoint(&mut self, endpoint: &Endpoint) -> EndpointResult {
        let site = self.site;
        let request = match self.prepare(endpoint) {
            Ok(request) => request,
            Err(e) => {
                let url = self.store.substitute(&format!("{}{}", self.base_url, endpoint.url));
                return EndpointResult::failed(endpoint.method, url, failure_reason(&e));
            }
        };

        tracing::info!("{} : {} '{}'", site.domain, request.method, request.url);

        let response = match self.session.execute(&request).await {
            Ok(response) => response,
            Err(e) => {
                return EndpointResult::failed(request.method, request.url, failure_reason(&e));
            }
        };

        let exchange = Exchange {
            domain: &site.domain,
            method: request.method,
            url: &request.url,
            response: &response,
        };

        let captures = match &endpoint.capture {
            Some(directives) => run_captures(&exchange, directives, &mut self.store),
            None => Vec::new(),
        };

        let mut failures = Vec::new();
        let mut failed_checks = Vec::new();
        if let Some(expected) = &endpoint.expected {
            let verdict = evaluate(&exchange, expected);
            tracing::debug!(
                "{} : {} of {} checks passed",
                site.domain,
                verdict.checks_run - verdict.failures.len(),
                verdict.checks_run
            );
            for failure in verdict.failures {
                failed_checks.push(failure.check);
                failures.push(failure.message);
            }
        }

        EndpointResult {
            method: request.method,
            url: request.url,
            failures,
            failed_checks,
            captures,
        }
    }

    /// Resolve placeholders and build the payload
    fn prepare(&self, endpoint: &Endpoint) -> Result<Request> {
        let template = format!("{}{}", self.base_url, endpoint.url);
        let url = self.store.substitute(&template);
        if url != template {
            tracing::debug!("{} : substituted '{}' -> '{}'", self.site.domain, template, url);
        }

        let payload = match &endpoint.data {
            Some(data) => match &data.body {
                Some(body) => {
                    let body = self.store.substitute(body);
                    Some(match data.mode {
                        DataMode::Raw => Payload::Raw(body),
                        DataMode::Form => Payload::Form(
                            form_fields(&body)
                                .map_err(|reason| Error::request_body(&self.site.domain, &url, reason))?,
                        ),
                    })
                }
                None => None,
            },
            None => None,
        };

        Ok(Request {
            method: endpoint.method,
            url,
            allow_redirects: endpoint.options.allow_redirects,
            payload,
        })
    }
}

/// Describe an endpoint-level error without repeating the domain
fn failure_reason(error: &Error) -> String {
    match error {
        Error::Transport { url, source, .. } => {
            format!("request to '{}' failed: {}", url, error_chain(source))
        }
        Error::RequestBody { url, reason, .. } => {
            format!("cannot build request body for '{}': {}", url, reason)
        }
        other => other.to_string(),
    }
}

/// Join an error with all of its sources
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Run every site in declared order and log the verdicts
///
/// A site whose runner cannot be created counts as failed; the remaining
/// sites still run.
pub async fn run_suite(suite: &Suite, http: &HttpConfig) -> SuiteResult {
    let mut result = SuiteResult::default();

    for site in &suite.sites {
        let site_result = match SiteRunner::new(site, http) {
            Ok(runner) => runner.run().await,
            Err(e) => {
                tracing::error!("{} : FAIL : {}", site.domain, e);
                SiteResult {
                    domain: site.domain.clone(),
                    errors: 1,
                    endpoints_total: site.endpoints.len(),
                    stopped: true,
                    endpoints: Vec::new(),
                }
            }
        };
        report_site(&site_result);
        result.sites.push(site_result);
    }

    tracing::info!(
        target: FINAL_TARGET,
        "{} of {} sites passed",
        result.sites_passed(),
        result.sites.len()
    );

    result
}

fn report_site(result: &SiteResult) {
    if result.passed() {
        tracing::info!(
            target: FINAL_TARGET,
            "{} : {} : all tests passed",
            result.domain,
            "SUCCESS".green()
        );
    } else {
        tracing::info!(
            target: FINAL_TARGET,
            "{} : {} : {} errors encountered",
            result.domain,
            "FAIL".red(),
            result.errors
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::config::{EndpointOptions, RequestData};
    use crate::testing::variables::Value;
    use std::collections::BTreeMap;

    fn site(endpoints: Vec<Endpoint>) -> Site {
        let mut variables = BTreeMap::new();
        variables.insert("user".to_string(), Value::from("ann"));
        Site {
            domain: "127.0.0.1:9".to_string(),
            secure: false,
            session: false,
            variables,
            endpoints,
            timeout_secs: Some(1),
        }
    }

    fn endpoint(url: &str, data: Option<RequestData>) -> Endpoint {
        Endpoint {
            url: url.to_string(),
            method: Method::Post,
            options: EndpointOptions::default(),
            data,
            capture: None,
            expected: None,
        }
    }

    #[test]
    fn test_prepare_substitutes_url_and_form_body() {
        let site = site(Vec::new());
        let runner = SiteRunner::new(&site, &HttpConfig::default()).unwrap();
        let request = runner
            .prepare(&endpoint(
                "/u/%user%",
                Some(RequestData {
                    body: Some(r#"{"name": "%user%"}"#.to_string()),
                    mode: DataMode::Form,
                }),
            ))
            .unwrap();

        assert_eq!(request.url, "http://127.0.0.1:9/u/ann");
        assert_eq!(
            request.payload,
            Some(Payload::Form(vec![("name".to_string(), "ann".to_string())]))
        );
        assert!(!request.allow_redirects);
    }

    #[test]
    fn test_prepare_raw_body_is_verbatim() {
        let site = site(Vec::new());
        let runner = SiteRunner::new(&site, &HttpConfig::default()).unwrap();
        let request = runner
            .prepare(&endpoint(
                "/raw",
                Some(RequestData {
                    body: Some("user=%user%&x=%missing%".to_string()),
                    mode: DataMode::Raw,
                }),
            ))
            .unwrap();

        assert_eq!(
            request.payload,
            Some(Payload::Raw("user=ann&x=%missing%".to_string()))
        );
    }

    #[test]
    fn test_prepare_rejects_bad_form_body() {
        let site = site(Vec::new());
        let runner = SiteRunner::new(&site, &HttpConfig::default()).unwrap();
        let err = runner
            .prepare(&endpoint(
                "/",
                Some(RequestData {
                    body: Some("user=ann".to_string()),
                    mode: DataMode::Form,
                }),
            ))
            .unwrap_err();

        assert!(failure_reason(&err).starts_with("cannot build request body for 'http://127.0.0.1:9/'"));
    }

    #[test]
    fn test_runner_is_seeded_from_site_variables() {
        let site = site(Vec::new());
        let runner = SiteRunner::new(&site, &HttpConfig::default()).unwrap();
        assert_eq!(runner.store.get("user"), Some(&Value::from("ann")));
    }

    #[tokio::test]
    async fn test_body_error_counts_as_failure_and_site_continues() {
        let site = site(vec![
            endpoint(
                "/first",
                Some(RequestData {
                    body: Some("not json".to_string()),
                    mode: DataMode::Form,
                }),
            ),
            endpoint(
                "/second",
                Some(RequestData {
                    body: Some("also not json".to_string()),
                    mode: DataMode::Form,
                }),
            ),
        ]);

        let result = SiteRunner::new(&site, &HttpConfig::default())
            .unwrap()
            .run()
            .await;

        assert_eq!(result.errors, 2);
        assert_eq!(result.endpoints_run(), 2);
        assert!(!result.stopped);
        assert!(!result.passed());
    }

    fn site_result(domain: &str, errors: usize) -> SiteResult {
        SiteResult {
            domain: domain.to_string(),
            errors,
            endpoints_total: 3,
            stopped: false,
            endpoints: Vec::new(),
        }
    }

    #[test]
    fn test_suite_exit_code() {
        let all_pass = SuiteResult {
            sites: vec![site_result("a", 0), site_result("b", 0)],
        };
        assert!(all_pass.passed());
        assert_eq!(all_pass.exit_code(), 0);

        let mixed = SuiteResult {
            sites: vec![site_result("a", 0), site_result("b", 2)],
        };
        assert!(!mixed.passed());
        assert_eq!(mixed.sites_passed(), 1);
        assert_eq!(mixed.exit_code(), 1);
    }

    #[test]
    fn test_empty_suite_passes() {
        assert_eq!(SuiteResult::default().exit_code(), 0);
    }

    #[test]
    fn test_error_chain_without_sources() {
        let err = Error::config_parse(std::path::Path::new("sites.yml"), "bad");
        assert_eq!(error_chain(&err), "Invalid configuration in 'sites.yml': bad");
        assert_eq!(failure_reason(&err), "Invalid configuration in 'sites.yml': bad");
    }
}
