use std::sync::Arc;

use crate::{
    cube::Cube,
    cube_cache::CubeCache,
    generator_stage::GeneratorStage,
    processor::{CubeProcessor, PendingCubes},
};

/// Holds cubes at [`GeneratorStage::Structures`] until the cube below has
/// reached that stage too.
///
/// Structures reach down into the cube below, so a cube may only finish once
/// the one beneath it has its terrain.
pub struct StructureGate {
    cache: Arc<dyn CubeCache>,
}

impl StructureGate {
    /// Creates a gate over `cache`.
    pub fn new(cache: Arc<dyn CubeCache>) -> Self {
        Self { cache }
    }
}

impl CubeProcessor for StructureGate {
    fn name(&self) -> &'static str {
        "structures"
    }

    fn calculate(&mut self, cube: &Arc<Cube>, _pending: &mut PendingCubes) -> bool {
        self.cache
            .get_cube(cube.pos().below())
            .is_some_and(|below| below.stage().at_least(GeneratorStage::Structures))
    }
}
