//! Logging setup.
//!
//! Log lines go to stderr; stdout carries only rendered results, so the
//! output of `imgdrop recent --json` stays machine-readable at any verbosity.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Upload results and rejections (info and above).
    #[default]
    Normal,
    /// Request lifecycle (debug and above).
    Verbose,
    /// Everything, including the HTTP client's own connection logs.
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    ///
    /// The HTTP stack stays at `warn` unless tracing is requested, so `-v`
    /// shows this crate's requests without hyper's connection chatter.
    #[must_use]
    pub fn default_directives(&self) -> String {
        let http = match self {
            Self::Quiet => Level::ERROR,
            Self::Normal | Self::Verbose => Level::WARN,
            Self::Trace => Level::DEBUG,
        };
        format!(
            "imgdrop={},reqwest={http},hyper_util={http}",
            self.to_level_filter()
        )
    }
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbosity`.
/// Colors are used only when stderr is a terminal.
///
/// # Examples
///
/// ```no_run
/// use imgdrop::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directives()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(verbosity >= Verbosity::Verbose)
            .without_time(),
    );

    // Already set in tests; ignore.
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
