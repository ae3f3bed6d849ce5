use std::sync::Arc;

use cubic_utils::{BlockPos, CubePos};

use crate::{
    cube::Cube,
    cube_cache::CubeCache,
    direction::{Axis, Direction},
    generator_stage::{GeneratorStage, cube_and_neighbors_at_least},
    light_storage::{LightStorage, MAX_LIGHT},
    opacity_index::OpacityIndex,
    processor::{CubeProcessor, PendingCubes},
    world::{LightType, WorldAccess},
};

/// Sky light can't diffuse into blocks this far below the ground level.
const SKY_DIFFUSION_DEPTH: i32 = 16;

/// Gives a cube its first sky light and seeds light propagation.
///
/// Sky light is computed per (x, z) from the column's opacity index, so a
/// cube can be lit without looking at the cubes above it. Voxels that the
/// column pass cannot light correctly, such as air under an overhang or a
/// light source, are handed to [`WorldAccess::ensure_light_correct`].
pub struct FirstLightProcessor<C: ?Sized, W: ?Sized> {
    cache: Arc<C>,
    world: Arc<W>,
}

impl<C: CubeCache + ?Sized, W: WorldAccess + ?Sized> FirstLightProcessor<C, W> {
    /// Creates a processor over `cache` and `world`.
    pub fn new(cache: Arc<C>, world: Arc<W>) -> Self {
        Self { cache, world }
    }

    /// Writes the sky light of every (x, z) of the cube.
    ///
    /// Returns true if the light at the bottom of this cube disagrees with the
    /// top of the cube below, meaning the cube below needs lighting again.
    fn update_skylight(&self, cube: &Cube) -> bool {
        let pos = cube.pos();
        let cube_min = pos.min_block().y();
        let cube_max = pos.max_block().y();

        let below = self.cache.get_cube(pos.below());
        let below_light = below.as_ref().map(|below| below.sky_light.read());

        let index = cube.column().opacity_index().read();
        let mut sky_light = cube.sky_light.write();
        let mut below_differs = false;
        if index.heightmap_max().is_none_or(|top| cube_min > top) {
            // Nothing in the column casts a shadow this high.
            sky_light.fill(MAX_LIGHT);
            if let Some(below_light) = &below_light {
                below_differs = slab(Axis::Y, 15)
                    .any(|(x, y, z)| below_light.get(x, y, z) != MAX_LIGHT);
            }
        } else {
            for z in 0..16 {
                for x in 0..16 {
                    let boundary =
                        skylight_column(&index, &mut sky_light, x, z, cube_min, cube_max);
                    if let Some(below_light) = &below_light {
                        below_differs |= below_light.get(x, 15, z) != boundary;
                    }
                }
            }
        }
        drop(sky_light);

        cube.mark_dirty();
        below_differs
    }

    /// Decides whether light at `pos` needs to spread and asks the world to
    /// spread it. Returns false if the world could not.
    fn diffuse_block(&self, pos: BlockPos) -> bool {
        let world = &*self.world;

        // Only air under something that casts a shadow can be missing sky
        // light that a neighbor could give it.
        let diffuse_sky = world.has_sky()
            && pos.y() > world.ground_level() - SKY_DIFFUSION_DEPTH
            && world.block_opacity(pos) == 0
            && world.light_at(LightType::Sky, pos) == 0;
        if diffuse_sky && !world.ensure_light_correct(LightType::Sky, pos) {
            return false;
        }

        if world.block_light_emission(pos) > 0
            && !world.ensure_light_correct(LightType::Block, pos)
        {
            return false;
        }
        true
    }

    /// Diffuses every voxel of the cube, stopping at the first failure.
    fn diffuse_cube(&self, pos: CubePos) -> bool {
        for x in 0..16 {
            for y in 0..16 {
                for z in 0..16 {
                    if !self.diffuse_block(pos.block(x, y, z)) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Diffuses the faces of the loaded neighbors that touch the cube.
    ///
    /// A wall standing against a cube that was lit earlier would otherwise
    /// never pick up light from this one.
    fn diffuse_neighbor_faces(&self, pos: CubePos) {
        for direction in Direction::ALL {
            let neighbor = direction.relative_cube(pos);
            if !self.cache.cube_exists(neighbor) {
                continue;
            }
            let layer = direction.opposite().face_local();
            for (x, y, z) in slab(direction.axis(), layer) {
                // Failures are picked up when the neighbor's own light changes.
                self.diffuse_block(neighbor.block(x, y, z));
            }
        }
    }
}

impl<C, W> CubeProcessor for FirstLightProcessor<C, W>
where
    C: CubeCache + ?Sized,
    W: WorldAccess + ?Sized,
{
    fn name(&self) -> &'static str {
        "first_light"
    }

    fn calculate(&mut self, cube: &Arc<Cube>, pending: &mut PendingCubes) -> bool {
        let pos = cube.pos();
        if !cube_and_neighbors_at_least(&*self.cache, pos, true, GeneratorStage::Lighting) {
            return false;
        }

        if self.update_skylight(cube) && pending.add(pos.below()) {
            log::trace!("Relighting {:?} below {pos:?}", pos.below());
        }

        if !self.diffuse_cube(pos) {
            log::trace!("Diffusion in {pos:?} is not ready");
            return false;
        }

        self.diffuse_neighbor_faces(pos);
        true
    }
}

/// Lights one (x, z) column of a cube spanning `cube_min..=cube_max`.
///
/// Returns the light that reaches the top of the cube below.
fn skylight_column(
    index: &OpacityIndex,
    sky_light: &mut LightStorage,
    x: usize,
    z: usize,
    cube_min: i32,
    cube_max: i32,
) -> u8 {
    let fill = |sky_light: &mut LightStorage, level: u8| {
        for y in 0..16 {
            sky_light.set(x, y, z, level);
        }
        level
    };

    let Some(gradient_max) = index.get_skylight_block_y(x, z) else {
        return fill(sky_light, MAX_LIGHT);
    };
    let gradient_min = gradient_max - i32::from(MAX_LIGHT);

    if cube_min > gradient_max {
        return fill(sky_light, MAX_LIGHT);
    }
    if cube_max < gradient_min {
        return fill(sky_light, 0);
    }

    let full = i32::from(MAX_LIGHT);
    let mut light = full;
    for y in (cube_min..=gradient_max.max(cube_max)).rev() {
        let mut opacity = i32::from(index.get_opacity(x, y, z));
        // Below the first shadow, light falls off by one per block.
        if opacity == 0 && light < full {
            opacity = 1;
        }
        light = (light - opacity).max(0);

        if y <= cube_max {
            sky_light.set(x, (y - cube_min) as usize, z, light as u8);
        }
    }

    if light != full {
        light = (light - 1).max(0);
    }
    light as u8
}

/// The 256 local positions of the layer at `layer` across `axis`.
fn slab(axis: Axis, layer: usize) -> impl Iterator<Item = (usize, usize, usize)> {
    (0..16).flat_map(move |a| {
        (0..16).map(move |b| match axis {
            Axis::X => (layer, a, b),
            Axis::Y => (a, layer, b),
            Axis::Z => (a, b, layer),
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests are allowed to panic
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::{
        block_light::BlockLightTable, block_storage::BlockStorage, config::LightingConfig,
        cube_cache::CubeMap, world::CubicWorld,
    };

    /// A world that records light checks instead of running them.
    struct RecordingWorld {
        inner: CubicWorld,
        sky_checks: AtomicUsize,
        block_checks: AtomicUsize,
        fail: AtomicBool,
    }

    impl WorldAccess for RecordingWorld {
        fn block_opacity(&self, pos: BlockPos) -> u8 {
            self.inner.block_opacity(pos)
        }

        fn block_light_emission(&self, pos: BlockPos) -> u8 {
            self.inner.block_light_emission(pos)
        }

        fn has_sky(&self) -> bool {
            self.inner.has_sky()
        }

        fn ground_level(&self) -> i32 {
            self.inner.ground_level()
        }

        fn light_at(&self, light: LightType, pos: BlockPos) -> u8 {
            self.inner.light_at(light, pos)
        }

        fn ensure_light_correct(&self, light: LightType, _pos: BlockPos) -> bool {
            match light {
                LightType::Sky => self.sky_checks.fetch_add(1, Ordering::Relaxed),
                LightType::Block => self.block_checks.fetch_add(1, Ordering::Relaxed),
            };
            !self.fail.load(Ordering::Relaxed)
        }
    }

    struct Fixture {
        cache: Arc<CubeMap>,
        world: Arc<RecordingWorld>,
        processor: FirstLightProcessor<CubeMap, RecordingWorld>,
        pending: PendingCubes,
    }

    impl Fixture {
        /// Ground level is 64.
        fn new() -> Self {
            Self::with_config(&LightingConfig::default())
        }

        fn with_config(config: &LightingConfig) -> Self {
            let cache = Arc::new(CubeMap::new());
            let world = Arc::new(RecordingWorld {
                inner: CubicWorld::new(cache.clone(), BlockLightTable::with_defaults(), config),
                sky_checks: AtomicUsize::new(0),
                block_checks: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            });
            let processor = FirstLightProcessor::new(cache.clone(), world.clone());
            Self {
                cache,
                world,
                processor,
                pending: PendingCubes::new(),
            }
        }

        fn load(&self, pos: CubePos, blocks: BlockStorage) -> Arc<Cube> {
            let cube = self.world.inner.load_cube(pos, blocks);
            cube.advance_stage(GeneratorStage::Lighting);
            cube
        }

        /// Loads `center` with everything it needs to be lit.
        fn load_ready(&self, center: CubePos) -> Arc<Cube> {
            for direction in Direction::HORIZONTAL {
                self.load(direction.relative_cube(center), BlockStorage::empty());
            }
            self.load(center.below(), BlockStorage::empty());
            self.load(center, BlockStorage::empty())
        }

        fn set_top(&self, cube: &Cube, top: i32) {
            let mut index = cube.column().opacity_index().write();
            for z in 0..16 {
                for x in 0..16 {
                    index.set_opacity(x, top, z, 15);
                }
            }
        }

        fn calculate(&mut self, cube: &Arc<Cube>) -> bool {
            self.processor.calculate(cube, &mut self.pending)
        }

        fn checks(&self) -> (usize, usize) {
            (
                self.world.sky_checks.load(Ordering::Relaxed),
                self.world.block_checks.load(Ordering::Relaxed),
            )
        }
    }

    fn sky(cube: &Cube, y: usize) -> u8 {
        cube.light(LightType::Sky, 7, y, 7)
    }

    #[test]
    fn test_unobstructed_column_is_fully_lit() {
        let mut fixture = Fixture::new();
        let cube = fixture.load_ready(CubePos::new(0, 0, 0));

        assert!(fixture.calculate(&cube));
        for y in 0..16 {
            assert_eq!(sky(&cube, y), 15);
        }
        // The cube below is still dark.
        assert!(fixture.pending.contains(cube.pos().below()));
        assert_eq!(fixture.checks(), (0, 0));
        assert_eq!(*cube.sky_light.read(), LightStorage::Uniform(15));
    }

    #[test]
    fn test_cube_above_every_top_stays_uniform() {
        let mut fixture = Fixture::new();
        let cube = fixture.load_ready(CubePos::new(0, 5, 0));
        fixture.set_top(&cube, 79);
        let below = fixture.cache.get_cube(cube.pos().below()).unwrap();
        below.sky_light.write().fill(MAX_LIGHT);

        assert!(fixture.calculate(&cube));
        assert_eq!(*cube.sky_light.read(), LightStorage::Uniform(15));
        // The cube below already agrees.
        assert!(fixture.pending.is_empty());

        // One shadow reaching into the cube rules out the uniform fill.
        cube.column().opacity_index().write().set_opacity(2, 85, 2, 15);
        assert!(fixture.calculate(&cube));
        assert!(matches!(*cube.sky_light.read(), LightStorage::Packed(_)));
        assert_eq!(cube.light(LightType::Sky, 2, 5, 2), 14);
        assert_eq!(cube.light(LightType::Sky, 2, 4, 2), 13);
        assert_eq!(cube.light(LightType::Sky, 3, 4, 3), 15);
        assert!(fixture.pending.contains(cube.pos().below()));
    }

    #[test]
    fn test_deep_cube_is_dark() {
        let mut fixture = Fixture::new();
        let cube = fixture.load_ready(CubePos::new(0, 0, 0));
        fixture.set_top(&cube, 200);

        assert!(fixture.calculate(&cube));
        for y in 0..16 {
            assert_eq!(sky(&cube, y), 0);
        }
        assert!(fixture.pending.is_empty());
    }

    #[test]
    fn test_dark_below_the_falloff_zone() {
        let mut fixture = Fixture::new();
        let cube = fixture.load_ready(CubePos::new(0, 5, 0));
        fixture.set_top(&cube, 100);

        assert!(fixture.calculate(&cube));
        // Blocks 80..=84 are more than 15 below the top.
        for y in 0..=4 {
            assert_eq!(sky(&cube, y), 0);
        }
        assert_eq!(sky(&cube, 15), 9);
    }

    #[test]
    fn test_light_falls_off_below_the_top() {
        let mut fixture = Fixture::new();
        let cube = fixture.load_ready(CubePos::new(0, 3, 0));
        fixture.set_top(&cube, 64);

        assert!(fixture.calculate(&cube));
        assert_eq!(sky(&cube, 15), 13);
        assert_eq!(sky(&cube, 0), 0);
        for y in 1..16 {
            assert!(sky(&cube, y) >= sky(&cube, y - 1));
        }
    }

    #[test]
    fn test_seam_with_cube_below() {
        let mut fixture = Fixture::new();
        let cube = fixture.load_ready(CubePos::new(0, 4, 0));
        fixture.set_top(&cube, 70);

        assert!(fixture.calculate(&cube));
        assert_eq!(sky(&cube, 0), 8);
        assert_eq!(sky(&cube, 6), 14);
        assert_eq!(sky(&cube, 7), 15);
        assert!(fixture.pending.contains(cube.pos().below()));

        let below = fixture.cache.get_cube(cube.pos().below()).unwrap();
        let set_below_top = |level: u8| {
            for z in 0..16 {
                for x in 0..16 {
                    below.set_light(LightType::Sky, x, 15, z, level);
                }
            }
        };

        fixture.pending.clear();
        set_below_top(7);
        assert!(fixture.calculate(&cube));
        assert!(fixture.pending.is_empty());

        set_below_top(8);
        assert!(fixture.calculate(&cube));
        assert!(fixture.pending.contains(cube.pos().below()));
    }

    #[test]
    fn test_waits_for_neighbors() {
        let mut fixture = Fixture::new();
        let center = CubePos::new(0, 0, 0);
        let cube = fixture.load(center, BlockStorage::empty());
        fixture.load(center.below(), BlockStorage::empty());
        assert!(!fixture.calculate(&cube));

        for direction in Direction::HORIZONTAL {
            let neighbor = fixture.load(direction.relative_cube(center), BlockStorage::empty());
            if direction == Direction::East {
                neighbor.advance_stage(GeneratorStage::Live);
            }
        }
        assert!(fixture.cache.unload_cube(center.below()).is_some());
        assert!(!fixture.calculate(&cube));
        assert_eq!(sky(&cube, 0), 0);

        fixture.cache.load_cube(center.below(), BlockStorage::empty());
        // A freshly loaded cube starts at Terrain.
        assert!(!fixture.calculate(&cube));
    }

    #[test]
    fn test_sky_diffusion_only_near_ground() {
        let fixture = Fixture::new();
        fixture.load(CubePos::new(0, 4, 0), BlockStorage::empty());
        fixture.load(CubePos::new(0, 0, 0), BlockStorage::empty());

        assert!(fixture.processor.diffuse_block(BlockPos::new(3, 69, 3)));
        assert_eq!(fixture.checks(), (1, 0));

        assert!(fixture.processor.diffuse_block(BlockPos::new(3, 14, 3)));
        assert_eq!(fixture.checks(), (1, 0));
    }

    #[test]
    fn test_no_sky_diffusion_without_sky() {
        let fixture = Fixture::with_config(&LightingConfig {
            has_sky: false,
            ..LightingConfig::default()
        });
        let mut blocks = BlockStorage::empty();
        blocks.set(3, 6, 3, BlockLightTable::GLOWSTONE);
        fixture.load(CubePos::new(0, 4, 0), blocks);

        // Dark air just above the ground would be a sky candidate with a sky.
        let air = BlockPos::new(3, 69, 3);
        assert_eq!(fixture.world.light_at(LightType::Sky, air), 0);
        assert!(fixture.processor.diffuse_block(air));
        assert_eq!(fixture.checks(), (0, 0));

        assert!(fixture.processor.diffuse_block(BlockPos::new(3, 70, 3)));
        assert_eq!(fixture.checks(), (0, 1));
    }

    #[test]
    fn test_failed_diffusion_aborts() {
        let mut fixture = Fixture::new();
        let cube = fixture.load_ready(CubePos::new(0, 4, 0));
        fixture.set_top(&cube, 200);
        fixture.world.fail.store(true, Ordering::Relaxed);

        assert!(!fixture.calculate(&cube));
        assert_eq!(fixture.checks(), (1, 0));
        // Sky light is written before diffusing.
        assert_eq!(sky(&cube, 15), 0);
    }

    #[test]
    fn test_light_sources_are_diffused() {
        let mut fixture = Fixture::new();
        let center = CubePos::new(0, 0, 0);
        fixture.load_ready(center);
        let mut blocks = BlockStorage::empty();
        blocks.set(4, 8, 4, BlockLightTable::GLOWSTONE);
        blocks.set(5, 8, 4, BlockLightTable::GLOWSTONE);
        assert!(fixture.cache.unload_cube(center).is_some());
        let cube = fixture.load(center, blocks);

        assert!(fixture.calculate(&cube));
        assert_eq!(fixture.checks(), (0, 2));
    }

    #[test]
    fn test_neighbor_face_failures_are_ignored() {
        let mut fixture = Fixture::new();
        let center = CubePos::new(0, 0, 0);
        let cube = fixture.load_ready(center);

        let mut blocks = BlockStorage::empty();
        blocks.set(3, 0, 3, BlockLightTable::GLOWSTONE);
        // Not on the face touching the center cube.
        blocks.set(3, 1, 3, BlockLightTable::GLOWSTONE);
        fixture.load(center.above(), blocks);
        fixture.world.fail.store(true, Ordering::Relaxed);

        assert!(fixture.calculate(&cube));
        assert_eq!(fixture.checks(), (0, 1));
    }

    #[test]
    fn test_slab_covers_one_face() {
        let voxels: Vec<_> = slab(Axis::Y, 15).collect();
        assert_eq!(voxels.len(), 256);
        assert!(voxels.iter().all(|&(_, y, _)| y == 15));
        assert!(slab(Axis::X, 0).all(|(x, _, _)| x == 0));
    }
}
