//! Runtime configuration persisted to disk as RON.
//!
//! Every section is `#[serde(default)]`, so older files keep loading as new
//! settings are added. Command-line flags override what the file says.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AtlasConfig, Config, DebugConfig, MAX_WORLD_VOLUME, RenderConfig, SimulationConfig,
    TerrainConfig, WorldConfig,
};
pub use error::ConfigError;
