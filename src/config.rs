//! Command-line options and the resolved monitor configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::core::dispatch::DISPATCH_TICK;
use crate::core::history::HISTORY_CAPACITY;
use crate::core::lifecycle::Timing;

pub const DEFAULT_LOG_FILE: &str = "sysmon-live.log";

#[derive(Debug, Parser)]
#[command(name = "sysmon-live")]
#[command(about = "Live host resource monitor")]
pub struct Cli {
    /// File that receives log output
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Output structured JSON logs
    #[arg(long)]
    pub json: bool,
}

/// Everything the monitor needs to start. Fixed once the monitor is running.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub log_file: PathBuf,
    pub debug: bool,
    pub json_logs: bool,
    pub timing: Timing,
    pub tick_rate: Duration,
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            debug: false,
            json_logs: false,
            timing: Timing::default(),
            tick_rate: DISPATCH_TICK,
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

impl MonitorConfig {
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

impl From<Cli> for MonitorConfig {
    fn from(cli: Cli) -> Self {
        MonitorConfig::default()
            .with_log_file(cli.log_file)
            .with_debug(cli.debug)
            .with_json_logs(cli.json)
    }
}
