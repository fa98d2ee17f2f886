mod app;
mod cli;
mod config;
mod effects;
mod history;
mod logging;
mod render;

use std::time::Duration;

use clap::Parser;
use ria_engine::EngineHandle;
use ria_logging::{ria_error, ria_info};

use crate::app::App;
use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    config.apply_overrides(&cli.global)?;
    logging::initialize(config.log, config.log_level);
    ria_info!(
        "ria starting api_url={} output_dir={:?}",
        config.api_url,
        config.output_dir
    );

    let engine = EngineHandle::new(config.engine_settings()?)?;
    let mut app = App::new(
        engine,
        config.output_dir.clone(),
        Duration::from_secs(cli.global.wait_secs),
        std::io::stdout(),
    );
    let result = app.run(cli.command);
    if let Err(err) = &result {
        ria_error!("Command failed: {:#}", err);
    }
    result
}
