//! Generation stages a cube moves through before it is live.

use cubic_utils::CubePos;

use crate::{cube_cache::CubeCache, direction::Direction};

/// Ordered generation stages. A cube only ever moves forward.
///
/// A cube at a stage is waiting for that stage's work; once the work is done
/// it moves to the next stage.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneratorStage {
    /// Waiting for terrain blocks.
    Terrain = 0,
    /// Terrain is done, waiting for caves, ravines and structures.
    Structures = 1,
    /// Blocks are final, waiting for first light.
    Lighting = 2,
    /// Fully generated and lit.
    Live = 3,
}

impl GeneratorStage {
    /// All stages in order.
    pub const ALL: [GeneratorStage; 4] = [
        GeneratorStage::Terrain,
        GeneratorStage::Structures,
        GeneratorStage::Lighting,
        GeneratorStage::Live,
    ];

    /// Returns true if `self` is `stage` or later.
    #[must_use]
    #[inline]
    pub fn at_least(self, stage: GeneratorStage) -> bool {
        self >= stage
    }

    /// Returns the stage after this one, or `None` for [`GeneratorStage::Live`].
    #[must_use]
    pub const fn next(self) -> Option<GeneratorStage> {
        match self {
            Self::Terrain => Some(Self::Structures),
            Self::Structures => Some(Self::Lighting),
            Self::Lighting => Some(Self::Live),
            Self::Live => None,
        }
    }

    /// Converts a raw ordinal back into a stage.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<GeneratorStage> {
        match ordinal {
            0 => Some(Self::Terrain),
            1 => Some(Self::Structures),
            2 => Some(Self::Lighting),
            3 => Some(Self::Live),
            _ => None,
        }
    }
}

/// Checks that a cube and its four horizontal neighbors are loaded and at
/// least at `stage`. With `include_below` the cube directly below must be too.
pub fn cube_and_neighbors_at_least<C: CubeCache + ?Sized>(
    cache: &C,
    pos: CubePos,
    include_below: bool,
    stage: GeneratorStage,
) -> bool {
    let ready = |pos: CubePos| {
        cache
            .get_cube(pos)
            .is_some_and(|cube| cube.stage().at_least(stage))
    };

    if !ready(pos) {
        return false;
    }
    if !Direction::HORIZONTAL
        .iter()
        .all(|direction| ready(direction.relative_cube(pos)))
    {
        return false;
    }
    !include_below || ready(pos.below())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block_storage::BlockStorage, cube_cache::CubeMap};

    #[test]
    fn test_total_order() {
        assert!(GeneratorStage::Live.at_least(GeneratorStage::Lighting));
        assert!(GeneratorStage::Lighting.at_least(GeneratorStage::Lighting));
        assert!(!GeneratorStage::Structures.at_least(GeneratorStage::Lighting));
        assert!(GeneratorStage::Terrain < GeneratorStage::Live);
    }

    #[test]
    fn test_next_walks_every_stage_once() {
        let mut stage = GeneratorStage::Terrain;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen, GeneratorStage::ALL);
        for stage in GeneratorStage::ALL {
            assert_eq!(GeneratorStage::from_ordinal(stage as u8), Some(stage));
        }
        assert_eq!(GeneratorStage::from_ordinal(4), None);
    }

    fn load_at(cache: &CubeMap, pos: CubePos, stage: GeneratorStage) {
        cache.load_cube(pos, BlockStorage::empty()).advance_stage(stage);
    }

    #[test]
    fn test_neighbors_must_exist_and_be_ready() {
        let cache = CubeMap::new();
        let center = CubePos::new(0, 0, 0);
        load_at(&cache, center, GeneratorStage::Lighting);
        assert!(!cube_and_neighbors_at_least(&cache, center, false, GeneratorStage::Lighting));

        for direction in Direction::HORIZONTAL {
            load_at(&cache, direction.relative_cube(center), GeneratorStage::Live);
        }
        assert!(cube_and_neighbors_at_least(&cache, center, false, GeneratorStage::Lighting));
        assert!(!cube_and_neighbors_at_least(&cache, center, true, GeneratorStage::Lighting));

        load_at(&cache, center.below(), GeneratorStage::Structures);
        assert!(!cube_and_neighbors_at_least(&cache, center, true, GeneratorStage::Lighting));

        load_at(&cache, center.below(), GeneratorStage::Lighting);
        assert!(cube_and_neighbors_at_least(&cache, center, true, GeneratorStage::Lighting));
    }
}
