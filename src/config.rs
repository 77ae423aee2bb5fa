//! Configuration file support for planview.
//!
//! Camera, room and highlight settings plus log verbosity, stored as
//! versioned JSON in the user's config directory.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::selection::Highlight;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Viewport camera settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial position; the camera always looks at the origin.
    pub position: [f32; 3],
    /// Radians per pixel of horizontal drag
    pub rotation_speed: f32,
    /// Distance change per unit of wheel delta
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: DEFAULT_FOV_Y_DEGREES,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            position: DEFAULT_CAMERA_POSITION,
            rotation_speed: DEFAULT_ROTATION_SPEED,
            zoom_speed: DEFAULT_ZOOM_SPEED,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

/// Procedural room and lighting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub floor_size: f32,
    pub floor_elevation: f32,
    pub wall_height: f32,
    pub wall_color: [u8; 3],
    pub wall_opacity: f32,
    pub background: [u8; 3],
    pub ambient_color: [u8; 3],
    pub ambient_intensity: f32,
    pub directional_color: [u8; 3],
    pub directional_intensity: f32,
    /// Direction from the scene towards the directional light
    pub light_direction: [f32; 3],
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            floor_size: DEFAULT_FLOOR_SIZE,
            floor_elevation: DEFAULT_FLOOR_ELEVATION,
            wall_height: DEFAULT_WALL_HEIGHT,
            wall_color: DEFAULT_WALL_COLOR,
            wall_opacity: DEFAULT_WALL_OPACITY,
            background: DEFAULT_BACKGROUND,
            ambient_color: DEFAULT_AMBIENT_COLOR,
            ambient_intensity: DEFAULT_AMBIENT_INTENSITY,
            directional_color: DEFAULT_DIRECTIONAL_COLOR,
            directional_intensity: DEFAULT_DIRECTIONAL_INTENSITY,
            light_direction: DEFAULT_LIGHT_DIRECTION,
        }
    }
}

/// Selection highlight settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub color: [u8; 3],
    pub alpha: f32,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_HIGHLIGHT_COLOR,
            alpha: DEFAULT_HIGHLIGHT_ALPHA,
        }
    }
}

impl From<HighlightConfig> for Highlight {
    fn from(config: HighlightConfig) -> Self {
        Highlight {
            color: config.color,
            alpha: config.alpha.clamp(0.0, 1.0),
        }
    }
}

/// Viewer configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub room: RoomConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl ViewerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            camera: CameraConfig::default(),
            room: RoomConfig::default(),
            highlight: HighlightConfig::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "planview-config.json"
    }

    /// Get the default config file path.
    /// Returns None on WASM (no filesystem access).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("planview").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("planview")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
