//! Effective settings: CLI flags over config file values over built-in defaults.

use std::path::PathBuf;

use docbot_core::ollama::DEFAULT_BASE_URL;
use docbot_core::response::Destination;

use crate::cli::Cli;
use crate::load_config::FileConfig;

pub const DEFAULT_MODEL: &str = "gemma2:2b";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model: String,
    pub output: Option<PathBuf>,
    pub base_url: String,
    pub verbose: bool,
    pub token_usage: bool,
    /// Always false when `output` is set; file output waits for the whole reply.
    pub stream: bool,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: &FileConfig) -> Self {
        let output = cli.output.clone().or_else(|| config.output.clone());
        let stream = cli.stream || config.stream.unwrap_or(false);

        Self {
            model: cli
                .model
                .clone()
                .or_else(|| config.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: cli
                .base_url
                .clone()
                .or_else(|| config.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            verbose: cli.verbose || config.verbose.unwrap_or(false),
            token_usage: cli.token_usage || config.token_usage.unwrap_or(false),
            stream: stream && output.is_none(),
            output,
        }
    }

    pub fn destination(&self) -> Destination {
        match &self.output {
            Some(path) => Destination::File(path.clone()),
            None => Destination::Stdout,
        }
    }
}
