//! A flat world to run the lighting pipeline on.

use std::sync::Arc;

use cubic_core::{
    BlockLightTable, CubeMap, CubicWorld, FirstLightProcessor, GeneratorPipeline, GeneratorStage,
    StructureGate, block_storage::BlockStorage,
};
use cubic_utils::{BlockStateId, CubePos};

use crate::config::CubicConfig;

/// Side length of the stone roof placed above the surface near the origin.
const OVERHANG_SIZE: i32 = 6;
/// Height of the roof above the surface.
const OVERHANG_HEIGHT: i32 = 3;

/// A generated flat world and the cubes waiting to be lit.
pub struct DemoWorld {
    pub cache: Arc<CubeMap>,
    pub world: Arc<CubicWorld>,
    /// Cubes to feed to the pipeline, bottom layer first.
    pub generated: Vec<CubePos>,
}

impl DemoWorld {
    /// Generates every cube in the configured area.
    ///
    /// The layer below `min_cube_y` is loaded as solid, already live stone so
    /// the bottom layer has something to rest on.
    pub fn generate(config: &CubicConfig) -> Self {
        let cache = Arc::new(CubeMap::new());
        let world = Arc::new(CubicWorld::new(
            cache.clone(),
            BlockLightTable::with_defaults(),
            &config.lighting,
        ));

        let mut generated = Vec::new();
        for y in config.min_cube_y - 1..=config.max_cube_y {
            for x in -config.radius..=config.radius {
                for z in -config.radius..=config.radius {
                    let pos = CubePos::new(x, y, z);
                    let cube = world.load_cube(pos, terrain(pos, config.surface_y));
                    if y < config.min_cube_y {
                        cube.advance_stage(GeneratorStage::Live);
                    } else {
                        generated.push(pos);
                    }
                }
            }
        }

        log::info!(
            "Generated {} cubes in {} columns",
            cache.cube_count(),
            cache.column_count()
        );
        Self {
            cache,
            world,
            generated,
        }
    }

    /// Builds the pipeline that lights this world.
    pub fn pipeline(&self) -> GeneratorPipeline {
        GeneratorPipeline::new(self.cache.clone())
            .with_processor(
                GeneratorStage::Structures,
                StructureGate::new(self.cache.clone()),
            )
            .with_processor(
                GeneratorStage::Lighting,
                FirstLightProcessor::new(self.cache.clone(), self.world.clone()),
            )
    }

    /// Number of loaded cubes at `stage`.
    pub fn count_at(&self, stage: GeneratorStage) -> usize {
        self.cache
            .cubes()
            .iter()
            .filter(|cube| cube.stage() == stage)
            .count()
    }

    /// Clears the dirty flag of every cube, returning how many had changed
    /// since the last call.
    pub fn save_changed(&self) -> usize {
        self.cache
            .cubes()
            .iter()
            .filter(|cube| cube.take_dirty())
            .count()
    }
}

/// Stone up to `surface_y`, a glowstone block at the top of every column's
/// center, and a roof over the blocks near the origin.
fn terrain(pos: CubePos, surface_y: i32) -> BlockStorage {
    let mut blocks = BlockStorage::empty();
    for local_y in 0..16 {
        for local_z in 0..16 {
            for local_x in 0..16 {
                let block = pos.block(local_x, local_y, local_z);
                if let Some(state) = terrain_block(block.x(), block.y(), block.z(), surface_y) {
                    blocks.set(local_x, local_y, local_z, state);
                }
            }
        }
    }
    blocks
}

fn terrain_block(x: i32, y: i32, z: i32, surface_y: i32) -> Option<BlockStateId> {
    let roof = (0..OVERHANG_SIZE).contains(&x) && (0..OVERHANG_SIZE).contains(&z);
    if y == surface_y - 1 && x.rem_euclid(16) == 8 && z.rem_euclid(16) == 8 {
        Some(BlockLightTable::GLOWSTONE)
    } else if y < surface_y || (roof && y == surface_y + OVERHANG_HEIGHT) {
        Some(BlockLightTable::STONE)
    } else {
        None
    }
}
