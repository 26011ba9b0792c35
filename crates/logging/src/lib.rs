//! Verbosity model and tracing subscriber setup for filedrop.
//!
//! Both binaries accept a repeatable `-v` flag. The count maps onto a
//! [`Verbosity`] level, which in turn selects the `tracing` filter the
//! subscriber is installed with. The `FILEDROP_LOG` environment variable
//! overrides the flag-derived filter with a full `EnvFilter` directive
//! for targeted diagnostics.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the flag-derived log filter.
pub const LOG_ENV_VAR: &str = "FILEDROP_LOG";

/// Output verbosity derived from repeated `-v` flags.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Verbosity {
    /// No `-v`: lifecycle warnings and errors only.
    #[default]
    Quiet,
    /// `-v`: session-level progress.
    Verbose,
    /// `-vv`: per-transfer detail.
    Debug,
    /// `-vvv` and beyond: everything, including queue and lock traffic.
    Trace,
}

impl Verbosity {
    /// Maps a `-v` flag count to a verbosity level.
    #[must_use]
    pub const fn from_flag_count(count: u8) -> Self {
        match count {
            0 => Self::Quiet,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Returns the `tracing` filter directive for this level.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Installs the global tracing subscriber for a binary.
///
/// The filter comes from `verbosity` unless [`LOG_ENV_VAR`] is set, in
/// which case the environment wins. Installation is a no-op if a
/// subscriber is already in place (as happens under `cargo test`).
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
