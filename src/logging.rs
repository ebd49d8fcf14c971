use std::env;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the tracing filter, e.g. `surge=debug`.
pub const LOG_ENV: &str = "SURGE_LOG";

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// replies. `SURGE_LOG` wins over `verbose`.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default_filter.to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();
}
