//! Log output for the CLI and the HTTP server.
//!
//! Two targets matter: `roadwatch` (store operations, migrations, rejected
//! requests) and `tower_http`, which emits one span per HTTP request with its
//! method, path, status and latency. Both follow the `-v`/`-q` flags unless
//! `RUST_LOG` is set.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the binary logs, picked from `-q`, `-v` and `-vv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only, such as storage failures behind a 500.
    Quiet,
    /// Startup, shutdown and request completions.
    #[default]
    Normal,
    /// Adds rejected requests and schema work.
    Verbose,
    /// Everything, including request span internals.
    Trace,
}

impl Verbosity {
    /// Most detailed level that is emitted.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter applied when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_directive(&self) -> String {
        let level = self.to_level_filter();
        format!("roadwatch={level},tower_http={level}")
    }

    fn env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

/// Install the global subscriber.
///
/// Later calls are no-ops, so tests and the binary can both call it.
///
/// ```no_run
/// use roadwatch::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let _ = tracing_subscriber::registry()
        .with(verbosity.env_filter())
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Route log output through the test harness, warnings and up.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_default_directive_covers_request_spans() {
        assert_eq!(
            Verbosity::Verbose.default_directive(),
            "roadwatch=DEBUG,tower_http=DEBUG"
        );
        assert_eq!(
            Verbosity::Quiet.default_directive(),
            "roadwatch=ERROR,tower_http=ERROR"
        );
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_test_logging();
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Trace);
    }
}
