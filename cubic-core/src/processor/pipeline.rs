use std::sync::Arc;

use cubic_utils::CubePos;

use crate::{
    cube::Cube,
    cube_cache::CubeCache,
    generator_stage::GeneratorStage,
    processor::{BatchProcessor, BatchStats, CubeProcessor},
};

type StageProcessor = BatchProcessor<Box<dyn CubeProcessor>>;

/// What one [`GeneratorPipeline::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    completed: [usize; GeneratorStage::ALL.len()],
    /// Cubes that reached [`GeneratorStage::Live`] this tick.
    pub went_live: usize,
}

impl TickReport {
    /// Cubes that finished `stage` this tick.
    #[must_use]
    pub fn completed(&self, stage: GeneratorStage) -> usize {
        self.completed[stage as usize]
    }

    /// Cubes that finished any stage this tick.
    #[must_use]
    pub fn total_completed(&self) -> usize {
        self.completed.iter().sum()
    }
}

/// Moves cubes through the generation stages.
///
/// Each stage may have a processor. A cube waits in the processor of its
/// current stage until the work succeeds, then moves to the next stage. Stages
/// without a processor are passed through immediately.
pub struct GeneratorPipeline {
    cache: Arc<dyn CubeCache>,
    stages: [Option<StageProcessor>; GeneratorStage::ALL.len()],
}

impl GeneratorPipeline {
    /// Creates a pipeline with no processors.
    pub fn new(cache: Arc<dyn CubeCache>) -> Self {
        Self {
            cache,
            stages: [const { None }; GeneratorStage::ALL.len()],
        }
    }

    /// Sets the processor that finishes `stage`.
    ///
    /// # Panics
    /// If `stage` is [`GeneratorStage::Live`], which has no work.
    #[must_use]
    pub fn with_processor(
        mut self,
        stage: GeneratorStage,
        processor: impl CubeProcessor + 'static,
    ) -> Self {
        assert!(stage != GeneratorStage::Live, "Live cubes have no stage work");
        self.stages[stage as usize] = Some(BatchProcessor::new(
            self.cache.clone(),
            Box::new(processor),
        ));
        self
    }

    /// Queues a loaded cube at its current stage.
    ///
    /// Returns false if the cube is not loaded.
    pub fn generate(&mut self, pos: CubePos) -> bool {
        let Some(cube) = self.cache.get_cube(pos) else {
            log::debug!("Cannot generate unloaded cube {pos:?}");
            return false;
        };
        self.route(&cube);
        true
    }

    /// Hands a cube to the processor of its stage, passing through stages
    /// that have none. Returns true if the cube ended up live.
    fn route(&mut self, cube: &Arc<Cube>) -> bool {
        loop {
            let stage = cube.stage();
            let Some(next) = stage.next() else {
                return true;
            };
            if let Some(processor) = &mut self.stages[stage as usize] {
                processor.add(cube.pos());
                return false;
            }
            cube.advance_stage(next);
        }
    }

    /// Runs one batch of up to `batch_size` cubes for every stage, earliest
    /// stage first.
    pub fn tick(&mut self, batch_size: usize) -> TickReport {
        let mut report = TickReport::default();
        for stage in GeneratorStage::ALL {
            let Some(processor) = &mut self.stages[stage as usize] else {
                continue;
            };
            let Some(next) = stage.next() else {
                continue;
            };

            let mut finished = Vec::new();
            report.completed[stage as usize] =
                processor.process_batch_with(batch_size, |cube| finished.push(cube.clone()));

            for cube in finished {
                // Cubes lit again after going live have nowhere to go.
                if !cube.advance_stage(next) {
                    continue;
                }
                if self.route(&cube) {
                    report.went_live += 1;
                }
            }
        }
        report
    }

    /// Returns true if no stage has queued cubes.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stages
            .iter()
            .flatten()
            .all(|processor| processor.pending().is_empty())
    }

    /// Number of cubes queued at `stage`.
    #[must_use]
    pub fn pending(&self, stage: GeneratorStage) -> usize {
        self.stages[stage as usize]
            .as_ref()
            .map_or(0, |processor| processor.pending().len())
    }

    /// Number of cubes queued over all stages.
    #[must_use]
    pub fn total_pending(&self) -> usize {
        GeneratorStage::ALL
            .into_iter()
            .map(|stage| self.pending(stage))
            .sum()
    }

    /// Totals of the processor at `stage`, if it has one.
    #[must_use]
    pub fn stats(&self, stage: GeneratorStage) -> Option<BatchStats> {
        self.stages[stage as usize].as_ref().map(BatchProcessor::stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block_storage::BlockStorage,
        cube_cache::CubeMap,
        processor::{PendingCubes, StructureGate},
    };

    /// Succeeds every other attempt.
    struct Flaky {
        ready: bool,
    }

    impl CubeProcessor for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn calculate(&mut self, _cube: &Arc<Cube>, _pending: &mut PendingCubes) -> bool {
            self.ready = !self.ready;
            self.ready
        }
    }

    #[test]
    fn test_stages_without_processor_pass_through() {
        let cache = Arc::new(CubeMap::new());
        let cube = cache.load_cube(CubePos::new(0, 0, 0), BlockStorage::empty());
        let mut pipeline = GeneratorPipeline::new(cache.clone());

        assert!(pipeline.generate(cube.pos()));
        assert_eq!(cube.stage(), GeneratorStage::Live);
        assert!(pipeline.is_idle());
        assert!(!pipeline.generate(CubePos::new(4, 4, 4)));
    }

    #[test]
    fn test_cube_waits_in_each_stage() {
        let cache = Arc::new(CubeMap::new());
        let cube = cache.load_cube(CubePos::new(0, 0, 0), BlockStorage::empty());
        let mut pipeline = GeneratorPipeline::new(cache.clone())
            .with_processor(GeneratorStage::Lighting, Flaky { ready: false });

        pipeline.generate(cube.pos());
        assert_eq!(cube.stage(), GeneratorStage::Lighting);
        assert_eq!(pipeline.pending(GeneratorStage::Lighting), 1);

        let report = pipeline.tick(8);
        assert_eq!(report.completed(GeneratorStage::Lighting), 1);
        assert_eq!(report.went_live, 1);
        assert_eq!(cube.stage(), GeneratorStage::Live);
        assert!(pipeline.is_idle());
    }

    #[test]
    fn test_structure_gate_orders_a_column() {
        let cache = Arc::new(CubeMap::new());
        let floor = cache.load_cube(CubePos::new(0, -1, 0), BlockStorage::empty());
        floor.advance_stage(GeneratorStage::Live);
        let lower = cache.load_cube(CubePos::new(0, 0, 0), BlockStorage::empty());
        let upper = cache.load_cube(CubePos::new(0, 1, 0), BlockStorage::empty());

        let mut pipeline = GeneratorPipeline::new(cache.clone())
            .with_processor(GeneratorStage::Structures, StructureGate::new(cache.clone()));
        pipeline.generate(upper.pos());
        pipeline.generate(lower.pos());
        assert_eq!(pipeline.total_pending(), 2);

        // Both are at Structures, so the upper cube's gate is already open.
        let report = pipeline.tick(8);
        assert_eq!(report.completed(GeneratorStage::Structures), 2);
        assert_eq!(report.went_live, 2);
        assert_eq!(upper.stage(), GeneratorStage::Live);
        assert!(pipeline.is_idle());
        assert_eq!(
            pipeline.stats(GeneratorStage::Structures).map(|stats| stats.completed),
            Some(2)
        );
        assert_eq!(pipeline.stats(GeneratorStage::Lighting), None);
    }

    #[test]
    fn test_gate_holds_cube_without_floor() {
        let cache = Arc::new(CubeMap::new());
        let cube = cache.load_cube(CubePos::new(0, 0, 0), BlockStorage::empty());
        let mut pipeline = GeneratorPipeline::new(cache.clone())
            .with_processor(GeneratorStage::Structures, StructureGate::new(cache.clone()));
        pipeline.generate(cube.pos());

        for _ in 0..3 {
            assert_eq!(pipeline.tick(8).total_completed(), 0);
        }
        assert_eq!(cube.stage(), GeneratorStage::Structures);
        assert!(!pipeline.is_idle());
    }
}
