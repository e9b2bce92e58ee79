//! Capturing values from responses
//!
//! A capture path is an XPath 1.0 expression evaluated over the response
//! text, parsed with libxml2's forgiving HTML parser:
//!
//! - `//form[@id='login']//input[@name='csrf']/@value` takes an attribute
//! - `//h1/text()` takes an element's own text nodes
//! - `//ul[@class='results']/li` takes each element's markup
//!
//! Node-set results are returned in document order. Expressions that
//! evaluate to a string, number or boolean give a single value.

use libxml::parser::{Parser, ParserOptions};
use libxml::tree::{Document, NodeType};
use libxml::xpath::Context;

use crate::http::Exchange;

use super::config::{CaptureDirective, CaptureMode};
use super::variables::{Value, VariableStore};

/// A response body parsed as HTML, ready for XPath queries
pub struct Page {
    document: Document,
}

impl Page {
    /// Parse `text` leniently; malformed markup is repaired, not rejected
    pub fn parse(text: &str) -> Result<Self, String> {
        // The text is already decoded; stop libxml2 re-reading <meta charset>.
        let options = ParserOptions {
            encoding: Some("utf-8"),
            ..ParserOptions::default()
        };
        let document = Parser::default_html()
            .parse_string_with_options(text, options)
            .map_err(|e| format!("cannot parse response as HTML: {:?}", e))?;
        Ok(Self { document })
    }

    /// Evaluate `path`, returning every result as a string
    ///
    /// Elements serialize to markup. Attributes and text nodes give their
    /// value as-is.
    pub fn query(&self, path: &str) -> Result<Vec<String>, String> {
        let context = Context::new(&self.document)
            .map_err(|_| "cannot create an XPath context".to_string())?;
        let object = context
            .evaluate(path)
            .map_err(|_| format!("invalid XPath expression '{}'", path))?;

        let nodes = object.get_nodes_as_vec();
        if nodes.is_empty() {
            // Scalar results; an empty node-set also casts to ""
            let scalar = object.to_string();
            return Ok(if scalar.is_empty() { Vec::new() } else { vec![scalar] });
        }

        Ok(nodes
            .iter()
            .map(|node| match node.get_type() {
                Some(NodeType::ElementNode) => self.document.node_to_string(node),
                _ => node.get_content(),
            })
            .collect())
    }
}

/// What happened to one capture directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A value was stored under `name`
    Stored { name: String, value: Value },
    /// Nothing matched; any existing value for `name` was kept
    Missed { name: String },
    /// The path or the document could not be evaluated; nothing was stored
    Invalid { name: String, reason: String },
}

/// Turn a list of matches into a stored value
///
/// One match is a scalar, several are a list, none is nothing.
pub fn value_from_matches(mut matches: Vec<String>) -> Option<Value> {
    match matches.len() {
        0 => None,
        1 => matches.pop().map(Value::Scalar),
        _ => Some(Value::List(matches)),
    }
}

/// Run every capture directive, in order, against one response
///
/// Misses and bad paths are logged as warnings and never fail the endpoint.
pub fn run_captures(
    exchange: &Exchange<'_>,
    directives: &[CaptureDirective],
    store: &mut VariableStore,
) -> Vec<CaptureOutcome> {
    let domain = exchange.domain;
    let mut page: Option<Result<Page, String>> = None;
    let mut outcomes = Vec::with_capacity(directives.len());

    for directive in directives {
        let name = match &directive.name {
            Some(name) => name.clone(),
            None => store.next_synthetic_name(),
        };

        let evaluated = match directive.mode {
            CaptureMode::Html => {
                tracing::debug!(
                    "{} : capture {} from {} '{}'",
                    domain,
                    directive.path,
                    exchange.method,
                    exchange.url
                );
                match page.get_or_insert_with(|| Page::parse(&exchange.response.text)) {
                    Ok(page) => page.query(&directive.path),
                    Err(reason) => Err(reason.clone()),
                }
            }
        };

        let matches = match evaluated {
            Ok(matches) => matches,
            Err(reason) => {
                tracing::warn!("{} : cannot capture '{}': {}", domain, name, reason);
                outcomes.push(CaptureOutcome::Invalid { name, reason });
                continue;
            }
        };

        match value_from_matches(matches) {
            Some(value) => {
                tracing::debug!("{} : '{}' has value(s) '{}'", domain, name, value);
                store.set(name.clone(), value.clone());
                outcomes.push(CaptureOutcome::Stored { name, value });
            }
            None => {
                tracing::warn!(
                    "{} : captured nothing for {} in '{}'",
                    domain,
                    directive.path,
                    exchange.url
                );
                outcomes.push(CaptureOutcome::Missed { name });
            }
        }
    }

    outcomes
}
