//! Configuration sections with defaults and RON persistence.

use std::path::{Path, PathBuf};

use blockworld_fluid::FluidConfig;
use blockworld_lighting::LightConfig;
use blockworld_voxel::ChunkLoadConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Chunk retention around the focus point.
    pub world: ChunkLoadConfig,
    /// Light engine budget and sky rules.
    pub lighting: LightConfig,
    /// Fluid tick rate and budget.
    pub fluid: FluidConfig,
    /// Terrain generator parameters.
    pub terrain: TerrainConfig,
    /// Fixed-step driver settings.
    pub run: RunConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Parameters of the noise terrain generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u32,
    /// Mean surface height in blocks.
    pub base_height: i32,
    /// Peak deviation from `base_height` in blocks.
    pub amplitude: f64,
    /// Horizontal noise frequency (per block).
    pub frequency: f64,
    /// Air at or below this height over the surface is filled with water.
    pub water_level: i32,
}

/// Fixed-step driver settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Simulated time per step, in milliseconds.
    pub step_ms: u64,
    /// Wall-clock frames longer than this are clamped before stepping.
    pub max_frame_ms: u64,
    /// Total simulated time before the driver exits, in seconds.
    pub duration_secs: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info,blockworld_fluid=trace").
    pub log_level: String,
    /// Also write JSON logs to the config directory in debug builds.
    pub log_to_file: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            base_height: 12,
            amplitude: 6.0,
            frequency: 0.02,
            water_level: 10,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step_ms: 50,
            max_frame_ms: 250,
            duration_secs: 10.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }
}

/// Platform config directory for blockworld, if the OS exposes one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("blockworld"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Rejects combinations the engines cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.unload_radius <= self.world.load_radius {
            return Err(ConfigError::Invalid(format!(
                "world.unload_radius ({}) must exceed world.load_radius ({})",
                self.world.unload_radius, self.world.load_radius
            )));
        }
        if self.fluid.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "fluid.tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.run.step_ms == 0 {
            return Err(ConfigError::Invalid("run.step_ms must be positive".to_string()));
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }
}
