//! Smoketest - declarative HTTP smoke tests
//!
//! Walks an ordered list of endpoints for each configured site, carrying
//! captured values from one response into later requests and checking
//! every response against its expectations.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{run_suite, SiteResult, Suite, SuiteResult};
