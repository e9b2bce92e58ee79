//! Smoke test engine
//!
//! Reads sites and endpoints documents, then runs each site's endpoints
//! in order: substitute placeholders, send the request, capture values,
//! check the response.

pub mod assertions;
pub mod capture;
mod config;
mod runner;
pub mod variables;

pub use config::*;
pub use runner::{run_suite, EndpointResult, SiteResult, SiteRunner, SuiteResult};
pub use variables::{Value, VariableStore};
