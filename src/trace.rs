//! Logging setup for the harness and its test suites.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "APPSTUDIO_LOG";

const DEFAULT_LEVELS: &str = "info";

/// Install the global subscriber.
///
/// Levels come from `APPSTUDIO_LOG` when set, `levels` otherwise. Events from
/// the `log` crate are forwarded. Calling this more than once is harmless,
/// only the first call has an effect.
pub fn init(color: bool, json: bool, levels: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(levels.unwrap_or(DEFAULT_LEVELS)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVELS));

    // Tests initialize this once per test, so a second registration is
    // expected to fail.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(color).with_test_writer())
            .try_init()
    };
}

/// Install a human readable subscriber for tests.
pub fn test_init() {
    init(false, false, None);
}
