//! Block states of a single cube.

use std::mem;

use cubic_utils::{BlockStateId, coords::CUBE_VOLUME};

/// The block states of one cube, indexed `y * 256 + z * 16 + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStorage {
    /// Every block is the same state.
    Uniform(BlockStateId),
    /// One state per block.
    Mixed(Box<[BlockStateId; CUBE_VOLUME]>),
}

#[inline]
fn index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
    (y << 8) | (z << 4) | x
}

impl BlockStorage {
    /// Storage filled with air.
    #[must_use]
    pub fn empty() -> Self {
        Self::Uniform(BlockStateId::AIR)
    }

    /// Returns the state at a local position.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockStateId {
        match self {
            Self::Uniform(state) => *state,
            Self::Mixed(states) => states[index(x, y, z)],
        }
    }

    /// Sets the state at a local position, returning the previous state.
    pub fn set(&mut self, x: usize, y: usize, z: usize, state: BlockStateId) -> BlockStateId {
        match self {
            Self::Uniform(current) if *current == state => state,
            Self::Uniform(current) => {
                let previous = *current;
                let mut states = Box::new([previous; CUBE_VOLUME]);
                states[index(x, y, z)] = state;
                *self = Self::Mixed(states);
                previous
            }
            Self::Mixed(states) => mem::replace(&mut states[index(x, y, z)], state),
        }
    }

    /// Returns true if every block is air.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Uniform(state) => *state == BlockStateId::AIR,
            Self::Mixed(states) => states.iter().all(|state| *state == BlockStateId::AIR),
        }
    }
}

impl Default for BlockStorage {
    fn default() -> Self {
        Self::empty()
    }
}
