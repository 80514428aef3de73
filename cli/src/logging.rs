//! Diagnostic log setup

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter for `-v` count; `RUST_LOG` wins when set
pub fn filter_for(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber.
///
/// Console output goes to stderr so JSON output on stdout stays clean.
/// With `directory`, a daily-rolling `conclave.log` is written there too;
/// keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(verbose: u8, directory: Option<&Path>) -> Option<WorkerGuard> {
    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "conclave.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter_for(verbose))
                .with(console)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter_for(verbose))
                .with(console)
                .init();
            None
        }
    }
}
