//! Smoketest - declarative HTTP smoke tests
//!
//! Runs the endpoints listed for each site in a YAML document and exits
//! non-zero if any site fails.

use std::process::ExitCode;

use clap::Parser;
use smoketest::cli;
use smoketest::commands::Args;
use smoketest::common::logging::{self, Verbosity};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    logging::init_cli(Verbosity::from_flags(args.quiet, args.loglevel));

    cli::dispatch(args).await
}
