//! Response descriptor and the per-request context handed to checks

use encoding_rs::{Encoding, UTF_8};
use mime::Mime;
use reqwest::header::{HeaderMap, CONTENT_TYPE};

use super::Method;

/// A completed HTTP response, fully read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers (lookups are case-insensitive)
    pub headers: HeaderMap,
    /// Body bytes after content-encoding decoding
    pub body: Vec<u8>,
    /// Body decoded with the declared charset (UTF-8 by default),
    /// invalid sequences replaced
    pub text: String,
    /// Final URL, after redirects if they were followed
    pub url: String,
}

impl HttpResponse {
    /// Build a response from its parts, deriving `text` from `body`
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>, url: impl Into<String>) -> Self {
        let (text, _, _) = charset(&headers).decode(&body);
        let text = text.into_owned();
        Self {
            status,
            headers,
            body,
            text,
            url: url.into(),
        }
    }

    /// Look up a header value by case-insensitive name
    ///
    /// Values that are not valid visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Encoding named by the `charset` parameter of `Content-Type`
///
/// Missing or unknown labels fall back to UTF-8.
fn charset(headers: &HeaderMap) -> &'static Encoding {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok())
        .and_then(|mime| {
            mime.get_param(mime::CHARSET)
                .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
        })
        .unwrap_or(UTF_8)
}

/// Everything a capture or assertion needs to know about one request
///
/// Passed explicitly so log lines and diagnostics are attributed to the
/// right site without any ambient state.
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    /// Site the request belongs to
    pub domain: &'a str,
    /// Verb that was sent
    pub method: Method,
    /// URL that was requested, after substitution
    pub url: &'a str,
    /// What came back
    pub response: &'a HttpResponse,
}
