//! Configuration structs with defaults, validation and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level globe viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window / framebuffer settings.
    pub window: WindowConfig,
    /// Where the tile imagery lives and which surface it is draped on.
    pub globe: GlobeConfig,
    /// Level-of-detail tuning.
    pub lod: LodConfig,
    /// Texture streaming and cache settings.
    pub streaming: StreamingConfig,
    /// Per-frame rendering toggles.
    pub render: RenderConfig,
    /// Simulated clock driving the sun position.
    pub simulation: SimulationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Framebuffer width in pixels. Feeds the screen-space error.
    pub width: u32,
    /// Framebuffer height in pixels.
    pub height: u32,
    /// Window title.
    pub title: String,
}

/// Reference surface the tiles are projected onto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EllipsoidKind {
    /// WGS84 radii in meters.
    Wgs84,
    /// Radius 1 on every axis.
    UnitSphere,
}

/// Atlas locations and surface shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobeConfig {
    /// Directory holding one subdirectory per LOD of day imagery.
    pub day_atlas_dir: PathBuf,
    /// Optional night imagery atlas with the same level layout.
    pub night_atlas_dir: Option<PathBuf>,
    /// Optional height map atlas with the same level layout.
    pub height_atlas_dir: Option<PathBuf>,
    /// Surface the tile meshes are projected onto.
    pub ellipsoid: EllipsoidKind,
}

/// Level-of-detail tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Screen-space error (pixels) a level must stay below to be selected.
    pub screen_space_error_threshold: f64,
    /// Upper bound on mesh vertices per tile axis.
    pub max_mesh_resolution: u32,
    /// Extra tiles per atlas tile along each axis of the most detailed level.
    pub tile_subdivision: u32,
}

/// Texture streaming and GPU cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Maximum number of textures resident on the GPU at once.
    pub texture_cache_capacity: usize,
    /// Frames an unanswered load request stays in flight before it may be re-issued.
    pub retry_after_frames: u64,
}

/// Rendering toggles mirrored from the GUI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
    /// Draw tile meshes as wireframe.
    pub wireframe: bool,
    /// Bind day textures.
    pub texture_enabled: bool,
    /// Bind night textures.
    pub night_enabled: bool,
    /// Bind height maps.
    pub terrain_enabled: bool,
    /// Draw tiles whose day texture is not ready yet instead of skipping them.
    pub draw_untextured: bool,
}

/// Simulated time for the sun, which decides where the night layer shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per real second.
    pub time_scale: f64,
    /// Simulated start, in days after January 1st 00:00 UTC.
    pub start_day: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log frame statistics once per frame.
    pub show_statistics: bool,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Tessera".to_string(),
        }
    }
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            day_atlas_dir: PathBuf::from("textures/daymaps"),
            night_atlas_dir: None,
            height_atlas_dir: None,
            ellipsoid: EllipsoidKind::UnitSphere,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            screen_space_error_threshold: 10.0,
            max_mesh_resolution: 64,
            tile_subdivision: 1,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            texture_cache_capacity: 128,
            retry_after_frames: 120,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            wireframe: false,
            texture_enabled: true,
            night_enabled: false,
            terrain_enabled: false,
            draw_untextured: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 3600.0,
            start_day: 0.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_statistics: false,
        }
    }
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

    /// Reject values the tiling and streaming layers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streaming.texture_cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "streaming.texture_cache_capacity",
                reason: "at least one texture must fit in the cache".to_string(),
            });
        }
        if !(self.lod.screen_space_error_threshold > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "lod.screen_space_error_threshold",
                reason: format!("{} is not positive", self.lod.screen_space_error_threshold),
            });
        }
        if self.lod.max_mesh_resolution < 2 {
            return Err(ConfigError::InvalidValue {
                field: "lod.max_mesh_resolution",
                reason: "a tile mesh needs at least 2 vertices per axis".to_string(),
            });
        }
        if self.lod.tile_subdivision == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lod.tile_subdivision",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.render.fov_degrees > 0.0 && self.render.fov_degrees < 180.0) {
            return Err(ConfigError::InvalidValue {
                field: "render.fov_degrees",
                reason: format!("{} is outside (0, 180)", self.render.fov_degrees),
            });
        }
        if !(self.simulation.time_scale.is_finite() && self.simulation.time_scale >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "simulation.time_scale",
                reason: format!("{} is not a finite, non-negative rate", self.simulation.time_scale),
            });
        }
        if !(self.simulation.start_day.is_finite() && self.simulation.start_day >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "simulation.start_day",
                reason: format!("{} is not a finite, non-negative day", self.simulation.start_day),
            });
        }
        Ok(())
    }

    fn read(config_path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(config_path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}
