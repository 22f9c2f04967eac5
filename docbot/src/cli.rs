///
/// This module implements the CLI interface for docbot: argument parsing and the async
/// [`run`] entrypoint used by `main` and by integration tests.
///
/// All pipeline logic (file collection, aggregation, chat, response delivery) lives in
/// the [`docbot-core`] crate. This module is strictly glue: it resolves settings, wires
/// the core pieces together and owns the terminal.
///
/// [`docbot-core`]: ../../docbot-core/
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

use docbot_core::chat::Chat;
use docbot_core::contract::ChatService;
use docbot_core::files::{aggregate, collect};
use docbot_core::ollama::OllamaClient;
use docbot_core::response::{Delivery, ResponseConsumer};

use crate::load_config::FileConfig;
use crate::progress::Spinner;
use crate::settings::Settings;

/// Invocation mistakes reported before any file is read or request is made.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("No file paths provided.")]
    NoFilePaths,
}

/// Document source files with a local language model.
#[derive(Parser, Debug)]
#[command(name = "docbot", version, disable_version_flag = true)]
pub struct Cli {
    /// The files or directories to process
    pub files: Vec<PathBuf>,

    /// Select a different model, make sure that it is available [default: gemma2:2b]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Write the response to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base URL of the Ollama server [default: http://127.0.0.1:11434]
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Run with verbose logging
    #[arg(short = 'l', long)]
    pub verbose: bool,

    /// Display information about token usage
    #[arg(short, long)]
    pub token_usage: bool,

    /// Show the response as it generates (ignored with --output)
    #[arg(short, long)]
    pub stream: bool,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}

/// Async CLI entrypoint for `main()` and integration tests, talking to Ollama.
pub async fn run(cli: Cli, config: FileConfig) -> Result<Delivery> {
    let settings = Settings::resolve(&cli, &config);
    let client = OllamaClient::new(settings.base_url.clone());
    run_with(cli, settings, client).await
}

/// Runs the pipeline against any [`ChatService`].
pub async fn run_with<S: ChatService>(cli: Cli, settings: Settings, service: S) -> Result<Delivery> {
    debug!(?settings, files = ?cli.files, "Resolved settings");

    if cli.files.is_empty() {
        return Err(UsageError::NoFilePaths.into());
    }

    let paths = collect(&cli.files).await?;
    info!(count = paths.len(), "Collected files");

    let contents = aggregate(&paths).await;
    debug!(document = %contents, "Aggregated document");

    let chat = Chat::new(service);
    let spinner = Spinner::start("Documenting code");
    let reply = chat
        .talk(settings.stream, &settings.model, &contents)
        .await;
    spinner.finish();
    let reply = reply.context("Error processing files")?;

    let mut consumer = ResponseConsumer::new(
        io::stdout(),
        io::stderr(),
        settings.destination(),
        settings.token_usage,
    );
    let delivery = consumer.consume(reply).await?;
    info!(?delivery, "Response delivered");
    Ok(delivery)
}
