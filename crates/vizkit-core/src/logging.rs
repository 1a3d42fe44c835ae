//! Logging bootstrap.
//!
//! The library only emits `tracing` events; applications that don't install
//! their own subscriber can call [`init`].

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

use crate::options::Options;

/// Environment variable holding an `EnvFilter` directive, e.g. `vizkit_shaders=trace`.
pub const LOG_ENV_VAR: &str = "VIZKIT_LOG";

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Filter level implied by [`Options::verbosity`].
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

/// Install a fmt subscriber filtered by `VIZKIT_LOG`, falling back to the
/// options' verbosity. Later calls are no-ops, as is calling this after the
/// application installed its own global subscriber.
pub fn init(options: &Options) {
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(options.verbosity)));
        if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::info!(program = %options.program_name, "logging initialized");
        }
    });
}
