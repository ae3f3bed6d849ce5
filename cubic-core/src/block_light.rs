//! Light properties of block states.

use cubic_utils::BlockStateId;
use rustc_hash::FxHashMap;

use crate::light_storage::MAX_LIGHT;

/// How a block state interacts with light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLight {
    /// Name of the block state.
    pub name: &'static str,
    /// Light levels removed when light passes through, 0..=15.
    pub opacity: u8,
    /// Light level the block emits, 0..=15.
    pub emission: u8,
}

/// Maps block state ids to their light properties.
///
/// Ids that were never registered are treated as fully opaque and dark, so a
/// missing entry can only make lighting darker, never leak light.
pub struct BlockLightTable {
    by_id: FxHashMap<BlockStateId, BlockLight>,
    by_name: FxHashMap<&'static str, BlockStateId>,
    allows_registering: bool,
}

impl BlockLightTable {
    /// Air.
    pub const AIR: BlockStateId = BlockStateId::AIR;
    /// A fully opaque solid block.
    pub const STONE: BlockStateId = BlockStateId(1);
    /// A transparent solid block.
    pub const GLASS: BlockStateId = BlockStateId(2);
    /// A partially translucent block.
    pub const WATER: BlockStateId = BlockStateId(3);
    /// An opaque light source.
    pub const GLOWSTONE: BlockStateId = BlockStateId(4);
    /// A block that lets most light through.
    pub const LEAVES: BlockStateId = BlockStateId(5);

    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_id: FxHashMap::default(),
            by_name: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Creates a table with the built-in block states registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (id, name, opacity, emission) in [
            (Self::AIR, "air", 0, 0),
            (Self::STONE, "stone", MAX_LIGHT, 0),
            (Self::GLASS, "glass", 0, 0),
            (Self::WATER, "water", 3, 0),
            (Self::GLOWSTONE, "glowstone", MAX_LIGHT, MAX_LIGHT),
            (Self::LEAVES, "leaves", 1, 0),
        ] {
            table.register(
                id,
                BlockLight {
                    name,
                    opacity,
                    emission,
                },
            );
        }
        table
    }

    /// Registers the light properties of a block state.
    ///
    /// # Panics
    /// If the table has been frozen.
    pub fn register(&mut self, id: BlockStateId, light: BlockLight) {
        assert!(
            self.allows_registering,
            "Cannot register block light after the table is frozen"
        );
        debug_assert!(light.opacity <= MAX_LIGHT && light.emission <= MAX_LIGHT);
        self.by_name.insert(light.name, id);
        self.by_id.insert(id, light);
    }

    /// Prevents further registration.
    pub fn freeze(&mut self) {
        self.allows_registering = false;
    }

    /// Returns the entry for a block state.
    #[must_use]
    pub fn get(&self, id: BlockStateId) -> Option<&BlockLight> {
        self.by_id.get(&id)
    }

    /// Returns the id registered under `name`.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<BlockStateId> {
        self.by_name.get(name).copied()
    }

    /// Opacity of a block state. Unknown states are opaque.
    #[must_use]
    pub fn opacity(&self, id: BlockStateId) -> u8 {
        self.get(id).map_or(MAX_LIGHT, |light| light.opacity)
    }

    /// Emitted light of a block state. Unknown states emit nothing.
    #[must_use]
    pub fn emission(&self, id: BlockStateId) -> u8 {
        self.get(id).map_or(0, |light| light.emission)
    }
}

impl Default for BlockLightTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
