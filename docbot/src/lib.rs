pub mod cli;
pub mod load_config;
pub mod progress;
pub mod settings;

pub use cli::{run, run_with, Cli, UsageError};
