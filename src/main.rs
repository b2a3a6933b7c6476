use std::sync::Arc;

use clap::Parser;

use sysmon_live::{
    app::App,
    config::{Cli, MonitorConfig},
    core::collector::SysinfoSource,
    logger,
};

fn main() -> sysmon_live::Result<()> {
    let config = MonitorConfig::from(Cli::parse());
    logger::init_logger(&config.log_file, config.json_logs, config.debug);
    tracing::info!(log_file = %config.log_file.display(), "starting sysmon-live");

    let source = Arc::new(SysinfoSource::new());
    let result = App::new(config, source).run();
    if let Err(err) = &result {
        tracing::error!(error = %err, "monitor exited with error");
    }
    result
}
