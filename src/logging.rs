//! Logging configuration using tracing

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable overriding the `-v` derived filter.
pub const LOG_ENV: &str = "MOBILE_LOCATOR_LOG";

/// Filter directive for a `-v` count.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "mobile_locator=info,warn",
        2 => "mobile_locator=debug,info",
        _ => "trace",
    }
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so reports printed on stdout stay clean. The level is
/// controlled by `MOBILE_LOCATOR_LOG` when set, otherwise by `-v`.
///
/// ```bash
/// MOBILE_LOCATOR_LOG=mobile_locator::locator=debug mobile-locator simulate ...
/// ```
pub fn init(verbose: u8) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose >= 2)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init();

    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}
