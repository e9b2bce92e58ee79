//! Logging and tracing configuration
//!
//! Every event goes through `tracing`. Per-site verdicts and the overall
//! roll-up use [`FINAL_TARGET`] so `--quiet` can keep them while
//! silencing everything else.

use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target for per-site final status lines and the suite roll-up
pub const FINAL_TARGET: &str = "smoketest::final";

/// Requested output verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only final status lines
    Quiet,
    /// Everything at or above this level, plus final status lines
    Level(Level),
}

impl Verbosity {
    /// Resolve CLI flags; a numeric log level overrides `--quiet`
    ///
    /// 0 is warn, 1 is info, 2 is debug, anything higher is trace.
    pub fn from_flags(quiet: bool, loglevel: Option<u8>) -> Self {
        match loglevel {
            Some(0) => Verbosity::Level(Level::WARN),
            Some(1) => Verbosity::Level(Level::INFO),
            Some(2) => Verbosity::Level(Level::DEBUG),
            Some(_) => Verbosity::Level(Level::TRACE),
            None if quiet => Verbosity::Quiet,
            None => Verbosity::Level(Level::INFO),
        }
    }

    /// Filter directives for this verbosity
    fn directives(self) -> String {
        match self {
            Verbosity::Quiet => format!("off,{FINAL_TARGET}=info"),
            Verbosity::Level(level) => {
                let level = level.to_string().to_lowercase();
                format!("warn,smoketest={level},{FINAL_TARGET}=info")
            }
        }
    }
}

/// Initialize tracing for the CLI (stdout logging)
///
/// `RUST_LOG` takes precedence over the requested verbosity. ANSI colour
/// is used only when stdout is a terminal.
pub fn init_cli(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let ansi = std::io::stdout().is_terminal();
    colored::control::set_override(ansi);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(ansi)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loglevel_overrides_quiet() {
        assert_eq!(
            Verbosity::from_flags(true, Some(2)),
            Verbosity::Level(Level::DEBUG)
        );
        assert_eq!(Verbosity::from_flags(true, None), Verbosity::Quiet);
    }

    #[test]
    fn test_loglevel_mapping() {
        assert_eq!(Verbosity::from_flags(false, None), Verbosity::Level(Level::INFO));
        assert_eq!(Verbosity::from_flags(false, Some(0)), Verbosity::Level(Level::WARN));
        assert_eq!(Verbosity::from_flags(false, Some(1)), Verbosity::Level(Level::INFO));
        assert_eq!(Verbosity::from_flags(false, Some(9)), Verbosity::Level(Level::TRACE));
    }

    #[test]
    fn test_final_lines_survive_every_verbosity() {
        for verbosity in [Verbosity::Quiet, Verbosity::Level(Level::WARN)] {
            assert!(verbosity.directives().contains("smoketest::final=info"));
        }
        assert!(Verbosity::Quiet.directives().starts_with("off,"));
    }
}
