//! Per-site HTTP session
//!
//! A [`Session`] owns everything that persists between requests for one
//! site: the configured clients and, in session mode, the cookie jar.
//! Two clients share the jar so each endpoint can choose whether
//! redirects are followed without losing cookies.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::redirect::Policy;
use reqwest::Client;
use serde_json::Value;

use crate::common::config::HttpConfig;
use crate::common::{Error, Result};

use super::decode::{decode_body, ACCEPTED_ENCODINGS};
use super::{HttpResponse, Method};

/// Request body, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// URL-encoded form fields, sent in order
    Form(Vec<(String, String)>),
    /// Sent verbatim
    Raw(String),
}

/// A fully resolved request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub allow_redirects: bool,
    pub payload: Option<Payload>,
}

/// HTTP state for one site
pub struct Session {
    domain: String,
    /// Client that follows redirects
    follow: Client,
    /// Client that returns redirect responses as-is
    direct: Client,
    /// Cookie jar, present only in session mode
    cookies: Option<Arc<Jar>>,
}

impl Session {
    /// Create a session for `domain`
    ///
    /// With `keep_cookies`, cookies set by any response are sent on later
    /// requests made through this session.
    pub fn new(domain: &str, keep_cookies: bool, config: &HttpConfig) -> Result<Self> {
        let cookies = keep_cookies.then(|| Arc::new(Jar::default()));

        let follow = build_client(
            config,
            Policy::limited(config.max_redirects),
            cookies.as_ref(),
        )?;
        let direct = build_client(config, Policy::none(), cookies.as_ref())?;

        Ok(Self {
            domain: domain.to_string(),
            follow,
            direct,
            cookies,
        })
    }

    /// Whether cookies persist across requests
    pub fn keeps_cookies(&self) -> bool {
        self.cookies.is_some()
    }

    /// Issue exactly one request and read the whole response
    pub async fn execute(&self, request: &Request) -> Result<HttpResponse> {
        let client = if request.allow_redirects {
            &self.follow
        } else {
            &self.direct
        };

        let mut builder = client.request(request.method.to_reqwest(), &request.url);
        match &request.payload {
            Some(Payload::Form(fields)) => builder = builder.form(fields),
            Some(Payload::Raw(body)) => builder = builder.body(body.clone()),
            None => {}
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(&self.domain, &request.url, e))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let raw = response
            .bytes()
            .await
            .map_err(|e| Error::transport(&self.domain, &request.url, e))?;

        let encoding = headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok());
        let body = match decode_body(encoding, &raw) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    "{} : could not decode {} body from '{}': {}",
                    self.domain,
                    encoding.unwrap_or("encoded"),
                    url,
                    e
                );
                raw.to_vec()
            }
        };

        tracing::debug!(status, bytes = body.len(), "{} : response from '{}'", self.domain, url);

        Ok(HttpResponse::new(status, headers, body, url))
    }
}

fn build_client(config: &HttpConfig, redirect: Policy, cookies: Option<&Arc<Jar>>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPTED_ENCODINGS));

    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .redirect(redirect);

    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(jar) = cookies {
        builder = builder.cookie_provider(Arc::clone(jar));
    }

    builder.build().map_err(Error::Client)
}

/// Turn a JSON object body into form fields
///
/// Scalars become one field each, arrays become repeated fields, and
/// null members are left out. Nested objects cannot be form-encoded.
pub fn form_fields(body: &str) -> std::result::Result<Vec<(String, String)>, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("form body is not valid JSON: {e}"))?;
    let Value::Object(members) = value else {
        return Err("form body must be a JSON object".to_string());
    };

    let mut fields = Vec::with_capacity(members.len());
    for (key, value) in members {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(item) = scalar_field(&key, item)? {
                        fields.push((key.clone(), item));
                    }
                }
            }
            other => {
                if let Some(value) = scalar_field(&key, other)? {
                    fields.push((key, value));
                }
            }
        }
    }
    Ok(fields)
}

fn scalar_field(key: &str, value: Value) -> std::result::Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(format!("form field '{key}' is nested and cannot be form-encoded"))
        }
    }
}
