//! CLI command handling
//!
//! Turns parsed arguments into a suite run and maps the outcome to a
//! process exit code.

use std::process::ExitCode;

use crate::commands::Args;
use crate::common::config::Config;
use crate::common::Result;
use crate::testing::{run_suite, Suite, SuiteResult};

/// Exit code when the suite could not be loaded
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// Load settings and documents, then run every site
pub async fn run(args: &Args) -> Result<SuiteResult> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(secs) = args.timeout {
        config.http.timeout_secs = secs;
    }

    let suite = Suite::load(&args.sites)?;
    tracing::debug!(sites = suite.sites.len(), "loaded '{}'", args.sites.display());

    Ok(run_suite(&suite, &config.http).await)
}

/// Run and report, returning the process exit code
pub async fn dispatch(args: Args) -> ExitCode {
    match run(&args).await {
        Ok(result) => ExitCode::from(result.exit_code()),
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_config() {
                ExitCode::from(EXIT_CONFIG_ERROR)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
