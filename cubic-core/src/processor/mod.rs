//! Queues that drive cubes through their generation stages.
//!
//! A [`BatchProcessor`] runs one [`CubeProcessor`] over a deduplicated FIFO of
//! cube addresses, a bounded number per call. Cubes that are not ready go back
//! to the end of the queue. The [`GeneratorPipeline`] chains one processor per
//! stage.

mod batch;
mod pending;
mod pipeline;
mod structure_gate;

pub use batch::{BatchProcessor, BatchStats, CubeProcessor};
pub use pending::PendingCubes;
pub use pipeline::{GeneratorPipeline, TickReport};
pub use structure_gate::StructureGate;
