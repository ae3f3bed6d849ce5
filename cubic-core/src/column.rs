//! A vertical stack of cubes sharing an (x, z) position.

use cubic_utils::{ColumnPos, locks::SyncRwLock};

use crate::opacity_index::OpacityIndex;

/// A column owns the opacity index shared by all of its cubes.
///
/// The index assumes a single writer per column. Readers hold the read guard
/// for as long as they need a consistent view.
#[derive(Debug)]
pub struct Column {
    pos: ColumnPos,
    opacity_index: SyncRwLock<OpacityIndex>,
}

impl Column {
    /// Creates a column with an empty opacity index.
    #[must_use]
    pub fn new(pos: ColumnPos) -> Self {
        Self::with_index(pos, OpacityIndex::new())
    }

    /// Creates a column with a previously saved opacity index.
    #[must_use]
    pub fn with_index(pos: ColumnPos, index: OpacityIndex) -> Self {
        Self {
            pos,
            opacity_index: SyncRwLock::new(index),
        }
    }

    /// The column position.
    #[must_use]
    pub fn pos(&self) -> ColumnPos {
        self.pos
    }

    /// The opacity index of this column.
    #[must_use]
    pub fn opacity_index(&self) -> &SyncRwLock<OpacityIndex> {
        &self.opacity_index
    }

    /// Returns the Y of the topmost opaque block at a local (x, z).
    #[must_use]
    pub fn get_skylight_block_y(&self, local_x: usize, local_z: usize) -> Option<i32> {
        self.opacity_index.read().get_skylight_block_y(local_x, local_z)
    }
}
