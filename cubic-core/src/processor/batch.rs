use std::sync::Arc;

use cubic_utils::CubePos;

use crate::{cube::Cube, cube_cache::CubeCache, processor::PendingCubes};

/// Per-cube work run by a [`BatchProcessor`].
pub trait CubeProcessor: Send {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the work for one cube.
    ///
    /// Returns false if the cube is not ready yet; it will be retried in a
    /// later batch. `pending` can be used to queue other cubes.
    fn calculate(&mut self, cube: &Arc<Cube>, pending: &mut PendingCubes) -> bool;
}

impl<P: CubeProcessor + ?Sized> CubeProcessor for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn calculate(&mut self, cube: &Arc<Cube>, pending: &mut PendingCubes) -> bool {
        (**self).calculate(cube, pending)
    }
}

/// Running totals of a [`BatchProcessor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Cubes whose work succeeded.
    pub completed: u64,
    /// Attempts that were not ready and went back into the queue.
    pub requeued: u64,
    /// Addresses whose cube was no longer loaded.
    pub dropped: u64,
}

/// Runs a [`CubeProcessor`] over a queue of cubes in bounded batches.
pub struct BatchProcessor<P> {
    cache: Arc<dyn CubeCache>,
    processor: P,
    pending: PendingCubes,
    stats: BatchStats,
}

impl<P: CubeProcessor> BatchProcessor<P> {
    /// Creates a processor with an empty queue.
    pub fn new(cache: Arc<dyn CubeCache>, processor: P) -> Self {
        Self {
            cache,
            processor,
            pending: PendingCubes::new(),
            stats: BatchStats::default(),
        }
    }

    /// Queues a cube. Returns false if it was already queued.
    pub fn add(&mut self, pos: CubePos) -> bool {
        self.pending.add(pos)
    }

    /// The queued cubes.
    #[must_use]
    pub fn pending(&self) -> &PendingCubes {
        &self.pending
    }

    /// Totals since creation.
    #[must_use]
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// The wrapped processor.
    #[must_use]
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Processes up to `max` queued cubes. Returns how many completed.
    pub fn process_batch(&mut self, max: usize) -> usize {
        self.process_batch_with(max, |_| {})
    }

    /// Processes up to `max` queued cubes, calling `on_complete` for each one
    /// whose work succeeded. Returns how many completed.
    ///
    /// The batch is the first `max` entries at the time of the call, so a
    /// cube that is requeued or queued during the batch waits for the next one.
    pub fn process_batch_with(
        &mut self,
        max: usize,
        mut on_complete: impl FnMut(&Arc<Cube>),
    ) -> usize {
        let count = max.min(self.pending.len());
        if count == 0 {
            return 0;
        }
        let _span =
            tracing::debug_span!("process_batch", processor = self.processor.name(), count)
                .entered();

        let mut completed = 0;
        for _ in 0..count {
            let Some(address) = self.pending.pop() else {
                break;
            };
            let Some(cube) = self.cache.get_cube(address.pos()) else {
                log::debug!(
                    "{}: dropping unloaded cube {:?}",
                    self.processor.name(),
                    address.pos()
                );
                self.stats.dropped += 1;
                continue;
            };

            if self.processor.calculate(&cube, &mut self.pending) {
                completed += 1;
                on_complete(&cube);
            } else {
                log::trace!("{}: cube {:?} not ready", self.processor.name(), cube.pos());
                self.pending.add_address(address);
                self.stats.requeued += 1;
            }
        }

        self.stats.completed += completed as u64;
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block_storage::BlockStorage, cube_cache::CubeMap};

    /// Fails every cube, recording the order it saw them in.
    struct NeverReady {
        seen: Vec<CubePos>,
    }

    impl CubeProcessor for NeverReady {
        fn name(&self) -> &'static str {
            "never_ready"
        }

        fn calculate(&mut self, cube: &Arc<Cube>, _pending: &mut PendingCubes) -> bool {
            self.seen.push(cube.pos());
            false
        }
    }

    /// Succeeds and queues the cube below.
    struct QueueBelow;

    impl CubeProcessor for QueueBelow {
        fn name(&self) -> &'static str {
            "queue_below"
        }

        fn calculate(&mut self, cube: &Arc<Cube>, pending: &mut PendingCubes) -> bool {
            pending.add(cube.pos().below());
            true
        }
    }

    fn cache_with(positions: &[CubePos]) -> Arc<CubeMap> {
        let cache = Arc::new(CubeMap::new());
        for &pos in positions {
            cache.load_cube(pos, BlockStorage::empty());
        }
        cache
    }

    #[test]
    fn test_failures_cycle_round_robin() {
        let positions = [
            CubePos::new(0, 0, 0),
            CubePos::new(1, 0, 0),
            CubePos::new(2, 0, 0),
        ];
        let mut batch =
            BatchProcessor::new(cache_with(&positions), NeverReady { seen: Vec::new() });
        for pos in positions {
            assert!(batch.add(pos));
        }

        assert_eq!(batch.process_batch(2), 0);
        assert_eq!(batch.process_batch(2), 0);
        assert_eq!(batch.process_batch(2), 0);
        assert_eq!(
            batch.processor().seen,
            vec![
                positions[0],
                positions[1],
                positions[2],
                positions[0],
                positions[1],
                positions[2],
            ]
        );
        assert_eq!(batch.pending().len(), 3);
        assert_eq!(batch.stats().requeued, 6);
    }

    #[test]
    fn test_each_cube_runs_once_per_batch() {
        let pos = CubePos::new(0, 0, 0);
        let mut batch = BatchProcessor::new(cache_with(&[pos]), NeverReady { seen: Vec::new() });
        batch.add(pos);
        batch.add(pos);

        assert_eq!(batch.process_batch(10), 0);
        assert_eq!(batch.processor().seen, vec![pos]);
    }

    #[test]
    fn test_unloaded_cubes_are_dropped() {
        let loaded = CubePos::new(0, 0, 0);
        let mut batch = BatchProcessor::new(cache_with(&[loaded]), QueueBelow);
        batch.add(loaded);
        batch.add(CubePos::new(9, 9, 9));

        let mut done = Vec::new();
        assert_eq!(batch.process_batch_with(10, |cube| done.push(cube.pos())), 1);
        assert_eq!(done, vec![loaded]);

        // The cube below was queued but is not processed until the next batch.
        assert!(batch.pending().contains(loaded.below()));
        assert_eq!(batch.process_batch(10), 0);
        assert!(batch.pending().is_empty());
        assert_eq!(
            batch.stats(),
            BatchStats {
                completed: 1,
                requeued: 0,
                dropped: 2,
            }
        );
    }

    #[test]
    fn test_empty_batch() {
        let mut batch = BatchProcessor::new(cache_with(&[]), QueueBelow);
        assert_eq!(batch.process_batch(0), 0);
        assert_eq!(batch.process_batch(5), 0);
    }
}
