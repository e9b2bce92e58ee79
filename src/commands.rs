//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smoketest", about = "Smoke test a series of web endpoints")]
#[command(version, long_about = None)]
pub struct Args {
    /// Sites YAML file to load
    pub sites: PathBuf,

    /// Only show site-level pass/fails
    #[arg(long, short)]
    pub quiet: bool,

    /// Log level (0 warn, 1 info, 2 debug, 3 trace). Overrides --quiet
    #[arg(long, value_name = "LEVEL")]
    pub loglevel: Option<u8>,

    /// Request timeout in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Settings file (default: the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
