use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use docbot::cli::{run, Cli};
use docbot::load_config::{config_path, load_config, FileConfig};
use docbot::settings::Settings;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload};

fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the response. The level starts from the
    // flag and is raised if the config file turns verbose on.
    let (level, level_handle) = reload::Layer::new(level_for(cli.verbose));
    tracing_subscriber::registry()
        .with(level)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();

    let config = match config_path().map(load_config).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "Error parsing TOML file, using defaults");
            FileConfig::default()
        }
    };

    let verbose = Settings::resolve(&cli, &config).verbose;
    if verbose && !cli.verbose {
        if let Err(e) = level_handle.reload(level_for(true)) {
            tracing::warn!(error = %e, "Could not raise log level");
        }
    }

    match run(cli, config).await {
        Ok(delivery) => {
            tracing::debug!(?delivery, "docbot completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
