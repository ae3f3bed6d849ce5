//! The world as seen by the lighting engine.

use std::{collections::VecDeque, sync::Arc};

use cubic_utils::{
    BlockPos, BlockStateId, ColumnPos, CubePos,
    coords::{MAX_BLOCK_Y, MIN_BLOCK_Y},
    locks::SyncMutex,
};
use rustc_hash::FxHashSet;

use crate::{
    block_light::BlockLightTable,
    block_storage::BlockStorage,
    column::Column,
    config::LightingConfig,
    cube::Cube,
    cube_cache::{CubeCache, CubeMap},
    direction::Direction,
    light_storage::MAX_LIGHT,
    opacity_index::{OpacityIndex, OpacityIndexError},
};

/// Height of a world without cubic storage.
const FLAT_WORLD_HEIGHT: i32 = 256;

/// The two light channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Light coming from the sky.
    Sky,
    /// Light emitted by blocks.
    Block,
}

/// Block and light queries the lighting engine needs from its host.
pub trait WorldAccess: Send + Sync {
    /// Light levels a block removes, 0..=15.
    fn block_opacity(&self, pos: BlockPos) -> u8;

    /// Light level a block emits, 0..=15.
    fn block_light_emission(&self, pos: BlockPos) -> u8;

    /// Whether the dimension has sky light.
    fn has_sky(&self) -> bool;

    /// Block Y of the ground level.
    fn ground_level(&self) -> i32;

    /// The stored light level at a position.
    fn light_at(&self, light: LightType, pos: BlockPos) -> u8;

    /// Makes sure the light at `pos` is consistent with its surroundings.
    ///
    /// Returns false if that could not be done yet, usually because the area
    /// around `pos` is not loaded.
    fn ensure_light_correct(&self, light: LightType, pos: BlockPos) -> bool;
}

/// Vertical bounds of a world and which parts of it are loaded.
pub trait WorldHeight {
    /// Lowest block Y.
    fn min_block_y(&self) -> i32;

    /// Highest block Y.
    fn max_block_y(&self) -> i32;

    /// Whether the world is taller than a flat world.
    fn is_tall_world(&self) -> bool {
        self.max_block_y() - self.min_block_y() + 1 > FLAT_WORLD_HEIGHT
    }

    /// Returns true if every block in the box from `min` to `max`, both
    /// inclusive, is loaded.
    fn is_area_loaded(&self, min: BlockPos, max: BlockPos) -> bool;
}

#[derive(Default)]
struct LightChecks {
    queue: VecDeque<(LightType, BlockPos)>,
    queued: FxHashSet<(LightType, BlockPos)>,
}

/// A cube world backed by a [`CubeMap`].
///
/// Keeps every column's opacity index current as blocks change and collects
/// light checks for the host to run.
pub struct CubicWorld {
    cubes: Arc<CubeMap>,
    blocks: BlockLightTable,
    has_sky: bool,
    ground_level: i32,
    light_checks: SyncMutex<LightChecks>,
}

impl CubicWorld {
    /// Creates a world over `cubes`.
    #[must_use]
    pub fn new(cubes: Arc<CubeMap>, blocks: BlockLightTable, config: &LightingConfig) -> Self {
        Self {
            cubes,
            blocks,
            has_sky: config.has_sky,
            ground_level: config.ground_level,
            light_checks: SyncMutex::new(LightChecks::default()),
        }
    }

    /// The cubes of this world.
    #[must_use]
    pub fn cubes(&self) -> &Arc<CubeMap> {
        &self.cubes
    }

    /// Loads a column from a saved opacity index, see [`CubeMap::load_column`].
    pub fn load_column(
        &self,
        pos: ColumnPos,
        data: &[u8],
    ) -> Result<Arc<Column>, OpacityIndexError> {
        let index = OpacityIndex::from_data(data)?;
        Ok(self.cubes.load_column(pos, index))
    }

    /// Loads a cube and records its opaque blocks in the column's index.
    pub fn load_cube(&self, pos: CubePos, blocks: BlockStorage) -> Arc<Cube> {
        let cube = self.cubes.load_cube(pos, blocks);
        if cube.blocks.read().is_empty() {
            return cube;
        }

        {
            let mut index = cube.column().opacity_index().write();
            for z in 0..16 {
                for x in 0..16 {
                    if let Some(local_y) = self.top_opaque_local(&cube, x, z) {
                        let block_y = pos.min_block().y() + local_y as i32;
                        index.set_opacity(x, block_y, z, MAX_LIGHT);
                    }
                }
            }
        }
        cube
    }

    /// Returns the block state at `pos`, if its cube is loaded.
    #[must_use]
    pub fn block_state(&self, pos: BlockPos) -> Option<BlockStateId> {
        let (x, y, z) = pos.local();
        self.cubes.get_cube(pos.cube()).map(|cube| cube.block(x, y, z))
    }

    /// Sets a block, updates the column's opacity index and queues light
    /// checks at `pos`.
    ///
    /// Returns the previous state, or `None` if the cube is not loaded.
    pub fn set_block(&self, pos: BlockPos, state: BlockStateId) -> Option<BlockStateId> {
        let cube = self.cubes.get_cube(pos.cube())?;
        let (x, y, z) = pos.local();
        let previous = cube.set_block(x, y, z, state);
        if previous == state {
            return Some(previous);
        }

        let opacity = self.blocks.opacity(state);
        let cleared_top = {
            let mut index = cube.column().opacity_index().write();
            let was_top = index.get_skylight_block_y(x, z) == Some(pos.y());
            index.set_opacity(x, pos.y(), z, opacity);
            was_top && index.get_skylight_block_y(x, z).is_none()
        };
        if cleared_top {
            self.rescan_top(&cube, x, z);
        }

        self.queue_light_check(LightType::Sky, pos);
        self.queue_light_check(LightType::Block, pos);
        Some(previous)
    }

    /// Finds the next opaque block below a removed top in the loaded cubes of
    /// the column and records it.
    fn rescan_top(&self, cube: &Arc<Cube>, x: usize, z: usize) {
        let column = cube.column();
        let start = cube.pos().y() + 1;
        for cube_y in self.cubes.cube_ys_below(column.pos(), start) {
            let Some(below) = self.cubes.get_cube(column.pos().cube(cube_y)) else {
                continue;
            };
            if let Some(local_y) = self.top_opaque_local(&below, x, z) {
                let block_y = below.pos().min_block().y() + local_y as i32;
                column
                    .opacity_index()
                    .write()
                    .set_opacity(x, block_y, z, MAX_LIGHT);
                log::trace!("New top at ({x}, {z}) in {:?}: {block_y}", column.pos());
                return;
            }
        }
    }

    fn top_opaque_local(&self, cube: &Cube, x: usize, z: usize) -> Option<usize> {
        let blocks = cube.blocks.read();
        (0..16)
            .rev()
            .find(|&y| self.blocks.opacity(blocks.get(x, y, z)) > 0)
    }

    fn queue_light_check(&self, light: LightType, pos: BlockPos) {
        let mut checks = self.light_checks.lock();
        if checks.queued.insert((light, pos)) {
            checks.queue.push_back((light, pos));
        }
    }

    /// Removes and returns every queued light check, oldest first.
    pub fn drain_light_checks(&self) -> Vec<(LightType, BlockPos)> {
        let mut checks = self.light_checks.lock();
        checks.queued.clear();
        checks.queue.drain(..).collect()
    }

    /// Number of queued light checks.
    #[must_use]
    pub fn pending_light_checks(&self) -> usize {
        self.light_checks.lock().queue.len()
    }

    fn area_loaded(&self, pos: BlockPos) -> bool {
        let cube = pos.cube();
        self.cubes.cube_exists(cube)
            && Direction::ALL
                .iter()
                .all(|direction| self.cubes.cube_exists(direction.relative_cube(cube)))
    }
}

impl WorldAccess for CubicWorld {
    fn block_opacity(&self, pos: BlockPos) -> u8 {
        self.block_state(pos)
            .map_or(MAX_LIGHT, |state| self.blocks.opacity(state))
    }

    fn block_light_emission(&self, pos: BlockPos) -> u8 {
        self.block_state(pos)
            .map_or(0, |state| self.blocks.emission(state))
    }

    fn has_sky(&self) -> bool {
        self.has_sky
    }

    fn ground_level(&self) -> i32 {
        self.ground_level
    }

    fn light_at(&self, light: LightType, pos: BlockPos) -> u8 {
        let (x, y, z) = pos.local();
        self.cubes
            .get_cube(pos.cube())
            .map_or(0, |cube| cube.light(light, x, y, z))
    }

    fn ensure_light_correct(&self, light: LightType, pos: BlockPos) -> bool {
        if !self.area_loaded(pos) {
            return false;
        }
        self.queue_light_check(light, pos);
        true
    }
}

impl WorldHeight for CubicWorld {
    fn min_block_y(&self) -> i32 {
        MIN_BLOCK_Y
    }

    fn max_block_y(&self) -> i32 {
        MAX_BLOCK_Y
    }

    fn is_area_loaded(&self, min: BlockPos, max: BlockPos) -> bool {
        let (min, max) = (min.cube(), max.cube());
        (min.x()..=max.x()).all(|x| {
            (min.z()..=max.z()).all(|z| {
                (min.y()..=max.y()).all(|y| self.cubes.cube_exists(CubePos::new(x, y, z)))
            })
        })
    }
}
