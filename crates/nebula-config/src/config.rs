//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World size and seed.
    pub world: WorldConfig,
    /// Height field noise.
    pub terrain: TerrainConfig,
    /// Chunking, rebuild budget and camera projection.
    pub render: RenderConfig,
    /// Texture atlas sources.
    pub atlas: AtlasConfig,
    /// Fixed-rate simulation.
    pub simulation: SimulationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for terrain and random ticks. `None` picks one from the clock.
    pub seed: Option<u64>,
    /// Size along X in blocks.
    pub width: i32,
    /// Size along Y in blocks.
    pub height: i32,
    /// Size along Z in blocks.
    pub depth: i32,
}

/// Terrain noise configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Number of noise octaves summed per height sample.
    pub octaves: u32,
    /// Amplitude falloff between octaves.
    pub persistence: f64,
    /// Multiplier on the base frequency derived from the world size.
    pub frequency_scale: f64,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Chunk edge length in blocks.
    pub chunk_size: i32,
    /// Maximum chunk rebuilds per frame.
    pub rebuilds_per_frame: usize,
    /// Dirty chunks whose wait differs by less than this rank by distance alone.
    pub staleness_bucket_ms: u64,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

/// Atlas configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
    /// Directory holding `<texture id>.png` files. Missing textures use the placeholder.
    pub texture_dir: PathBuf,
    /// RON file of block models. Blocks without a model keep their built-in faces.
    pub model_file: PathBuf,
    /// Generate a full mip chain for the atlas.
    pub build_mips: bool,
}

/// Fixed-timestep simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation ticks per second.
    pub ticks_per_second: f64,
    /// Upper bound on ticks run in a single frame.
    pub max_ticks_per_frame: u32,
    /// Random block ticks per chunk per simulation tick.
    pub random_ticks_per_chunk: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            width: 256,
            height: 64,
            depth: 256,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            octaves: 16,
            persistence: 0.5,
            frequency_scale: 1.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            rebuilds_per_frame: 8,
            staleness_bucket_ms: 2000,
            fov: 90.0,
            near: 0.05,
            far: 1000.0,
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            texture_dir: PathBuf::from("assets/textures/block"),
            model_file: PathBuf::from("assets/models/block.ron"),
            build_mips: true,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20.0,
            max_ticks_per_frame: 100,
            random_ticks_per_chunk: 3,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl WorldConfig {
    pub fn dims(&self) -> [i32; 3] {
        [self.width, self.height, self.depth]
    }
}

/// Most blocks a world may hold; block indices must fit an `i32`.
pub const MAX_WORLD_VOLUME: i64 = i32::MAX as i64;

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
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

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Rejects values that cannot produce a world or a frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| Err(ConfigError::Invalid { field, reason });
        let [w, h, d] = self.world.dims();
        if w <= 0 || h <= 0 || d <= 0 {
            return invalid("world", format!("size {w}x{h}x{d} must be positive"));
        }
        let volume = w as i64 * h as i64 * d as i64;
        if volume > MAX_WORLD_VOLUME {
            return invalid(
                "world",
                format!("size {w}x{h}x{d} holds {volume} blocks, limit is {MAX_WORLD_VOLUME}"),
            );
        }
        if self.render.chunk_size <= 0 {
            return invalid(
                "render.chunk_size",
                format!("{} must be positive", self.render.chunk_size),
            );
        }
        if !(self.render.near > 0.0 && self.render.near < self.render.far) {
            return invalid(
                "render.near",
                format!("need 0 < near < far, got {} and {}", self.render.near, self.render.far),
            );
        }
        if !(self.render.fov > 0.0 && self.render.fov < 180.0) {
            return invalid("render.fov", format!("{} is not in (0, 180)", self.render.fov));
        }
        if !(self.simulation.ticks_per_second > 0.0) {
            return invalid(
                "simulation.ticks_per_second",
                format!("{} must be positive", self.simulation.ticks_per_second),
            );
        }
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
