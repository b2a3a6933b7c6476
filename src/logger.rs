use std::fs::OpenOptions;
use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the default log filter.
pub const LOG_ENV: &str = "SYSMON_LOG";

fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("sysmon_live=debug")
        } else {
            EnvFilter::new("sysmon_live=info")
        }
    })
}

/// Install the global subscriber, writing to `path`.
///
/// The terminal belongs to the dashboard, so logs only ever go to a file.
/// If the file cannot be opened logging stays disabled.
pub fn init_logger(path: &Path, json_mode: bool, debug: bool) {
    let log_file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(_) => return,
    };

    if json_mode {
        tracing_subscriber::registry()
            .with(filter(debug))
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(log_file)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter(debug))
            .with(
                fmt::layer()
                    .compact()
                    .with_thread_names(true)
                    .with_writer(log_file)
                    .with_ansi(false),
            )
            .init();
    }
}
