//! This module contains the `Cube` struct, a 16x16x16 block of the world.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU8, Ordering},
};

use cubic_utils::{BlockStateId, CubePos, locks::SyncRwLock};

use crate::{
    block_storage::BlockStorage, column::Column, generator_stage::GeneratorStage,
    light_storage::LightStorage, world::LightType,
};

/// A 16x16x16 block of voxels with a sky light and a block light channel.
///
/// Each storage sits behind its own lock so the lighting pass can write light
/// while other readers look at the blocks.
#[derive(Debug)]
pub struct Cube {
    pos: CubePos,
    column: Arc<Column>,
    stage: AtomicU8,
    /// Block states.
    pub blocks: SyncRwLock<BlockStorage>,
    /// Sky light channel.
    pub sky_light: SyncRwLock<LightStorage>,
    /// Block light channel.
    pub block_light: SyncRwLock<LightStorage>,
    dirty: AtomicBool,
}

impl Cube {
    /// Creates a freshly generated cube at [`GeneratorStage::Terrain`].
    ///
    /// Both light channels start dark.
    #[must_use]
    pub fn new(pos: CubePos, column: Arc<Column>, blocks: BlockStorage) -> Self {
        debug_assert_eq!(pos.column(), column.pos(), "Cube must belong to its column");
        Self {
            pos,
            column,
            stage: AtomicU8::new(GeneratorStage::Terrain as u8),
            blocks: SyncRwLock::new(blocks),
            sky_light: SyncRwLock::new(LightStorage::dark()),
            block_light: SyncRwLock::new(LightStorage::dark()),
            dirty: AtomicBool::new(true),
        }
    }

    /// The cube position.
    #[must_use]
    pub fn pos(&self) -> CubePos {
        self.pos
    }

    /// The column this cube belongs to.
    #[must_use]
    pub fn column(&self) -> &Arc<Column> {
        &self.column
    }

    /// The current generation stage.
    #[must_use]
    pub fn stage(&self) -> GeneratorStage {
        GeneratorStage::from_ordinal(self.stage.load(Ordering::Acquire))
            .unwrap_or(GeneratorStage::Terrain)
    }

    /// Moves the cube forward to `stage`. Earlier stages are ignored.
    ///
    /// Returns true if the stage changed.
    pub fn advance_stage(&self, stage: GeneratorStage) -> bool {
        let previous = self.stage.fetch_max(stage as u8, Ordering::AcqRel);
        previous < stage as u8
    }

    /// Returns the block state at a local position.
    #[must_use]
    pub fn block(&self, x: usize, y: usize, z: usize) -> BlockStateId {
        self.blocks.read().get(x, y, z)
    }

    /// Sets a block state without touching the column's opacity index.
    ///
    /// Returns the previous state.
    pub fn set_block(&self, x: usize, y: usize, z: usize, state: BlockStateId) -> BlockStateId {
        let previous = self.blocks.write().set(x, y, z, state);
        if previous != state {
            self.mark_dirty();
        }
        previous
    }

    /// Returns the storage for a light channel.
    #[must_use]
    pub fn light_storage(&self, light: LightType) -> &SyncRwLock<LightStorage> {
        match light {
            LightType::Sky => &self.sky_light,
            LightType::Block => &self.block_light,
        }
    }

    /// Returns the light level at a local position.
    #[must_use]
    pub fn light(&self, light: LightType, x: usize, y: usize, z: usize) -> u8 {
        self.light_storage(light).read().get(x, y, z)
    }

    /// Sets the light level at a local position.
    pub fn set_light(&self, light: LightType, x: usize, y: usize, z: usize, level: u8) {
        let previous = self.light_storage(light).write().set(x, y, z, level);
        if previous != level {
            self.mark_dirty();
        }
    }

    /// Marks the cube as changed since it was last saved.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns true if the cube changed since it was last saved.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clears the dirty flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}
