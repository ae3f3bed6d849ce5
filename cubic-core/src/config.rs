//! Lighting settings read from the host's config file.

use cubic_utils::coords::{MAX_BLOCK_Y, MIN_BLOCK_Y};
use serde::Deserialize;

/// Settings for first light.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LightingConfig {
    /// Maximum number of cubes each stage processes per tick.
    pub batch_size: usize,
    /// Block Y of the world's ground level. Sky light is only diffused into
    /// dark air above `ground_level - 16`.
    pub ground_level: i32,
    /// Whether the dimension has sky light at all.
    pub has_sky: bool,
}

impl LightingConfig {
    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(1..=65_536).contains(&self.batch_size) {
            return Err("Lighting batch size must be in range 1..65536");
        }
        if !(MIN_BLOCK_Y..=MAX_BLOCK_Y).contains(&self.ground_level) {
            return Err("Ground level must be inside the world's block Y range");
        }
        Ok(())
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            ground_level: 64,
            has_sky: true,
        }
    }
}
