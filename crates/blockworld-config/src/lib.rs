//! Configuration for the blockworld simulation.
//!
//! Settings persist to disk as `config.ron`. Every section is
//! `#[serde(default)]`, so files written by older or newer builds still load.
//! Command-line flags override whatever was read from disk.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, RunConfig, TerrainConfig, default_config_dir};
pub use error::ConfigError;
