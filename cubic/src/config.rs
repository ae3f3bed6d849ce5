use std::{fs, io, path::Path};

use cubic_core::LightingConfig;
use cubic_utils::coords::{MAX_CUBE_Y, MIN_CUBE_Y};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/cubic_config.json5");

/// Errors from loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config file I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON5 for the config.
    #[error("config file is malformed: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Settings for the demo world and its tick loop.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CubicConfig {
    pub tick_interval_ms: u64,
    pub max_ticks: u64,
    pub radius: i32,
    pub min_cube_y: i32,
    pub max_cube_y: i32,
    pub surface_y: i32,
    #[serde(default)]
    pub lighting: LightingConfig,
}

impl CubicConfig {
    /// Reads the config at `path`, writing the default one there first if the
    /// file does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config_str = fs::read_to_string(path)?;
            let config: CubicConfig = serde_json5::from_str(&config_str)?;
            config.validate().map_err(ConfigError::Invalid)?;
            Ok(config)
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Wrote default config to {}", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.tick_interval_ms == 0 {
            return Err("Tick interval must be at least 1 ms");
        }
        if !(0..=64).contains(&self.radius) {
            return Err("Radius must be in range 0..64");
        }
        if self.min_cube_y > self.max_cube_y {
            return Err("min_cube_y must not be above max_cube_y");
        }
        // The layer below min_cube_y is loaded as the floor.
        if self.min_cube_y <= MIN_CUBE_Y || self.max_cube_y > MAX_CUBE_Y {
            return Err("Cube y range is outside the world");
        }
        if self.max_cube_y - self.min_cube_y >= 64 {
            return Err("At most 64 cube layers can be generated");
        }
        self.lighting.validate()
    }
}

impl Default for CubicConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            max_ticks: 1000,
            radius: 4,
            min_cube_y: -2,
            max_cube_y: 6,
            surface_y: 64,
            lighting: LightingConfig::default(),
        }
    }
}
