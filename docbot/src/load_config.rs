/// `load_config` module: reads the optional per-user TOML configuration file.
///
/// # Responsibilities
/// - Locate the config file (`~/.docbot-config.toml`)
/// - Parse it into [`FileConfig`], where every key is optional
/// - Treat a missing file as an empty configuration
///
/// # Errors
/// A file that exists but cannot be read or parsed is an error here; `main` logs it
/// and falls back to an empty configuration, so it is never fatal.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_FILE_NAME: &str = ".docbot-config.toml";

/// Values read from the config file. Absent keys stay `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub model: Option<String>,
    pub output: Option<PathBuf>,
    #[serde(alias = "base_url")]
    pub base_url: Option<String>,
    pub verbose: Option<bool>,
    #[serde(alias = "token_usage")]
    pub token_usage: Option<bool>,
    pub stream: Option<bool>,
}

/// `$HOME/.docbot-config.toml`, or `None` when no home directory is known.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Loads the config file at `path`; a missing file yields an empty configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        info!(config_path = ?path_ref, "No config file found, using defaults");
        return Ok(FileConfig::default());
    }

    let content = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML file {}", path_ref.display()))?;

    info!(config_path = ?path_ref, ?config, "Loaded config file");
    Ok(config)
}
