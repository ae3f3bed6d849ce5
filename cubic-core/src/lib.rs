//! # Cubic Core
//!
//! Lighting bootstrap for worlds stored as an unbounded stack of 16x16x16
//! cubes per column.
//!
//! Each column keeps an [`OpacityIndex`] of its topmost opaque blocks. Freshly
//! generated cubes move through the [`GeneratorStage`]s in a
//! [`GeneratorPipeline`]; the lighting stage runs the [`FirstLightProcessor`],
//! which computes sky light from the index alone and retries cubes whose
//! neighbors are not ready yet.

pub mod block_light;
pub mod block_storage;
pub mod column;
pub mod config;
pub mod cube;
pub mod cube_cache;
pub mod direction;
pub mod generator_stage;
pub mod light_storage;
pub mod lighting;
pub mod opacity_index;
pub mod processor;
pub mod world;

pub use block_light::BlockLightTable;
pub use column::Column;
pub use config::LightingConfig;
pub use cube::Cube;
pub use cube_cache::{CubeCache, CubeMap};
pub use generator_stage::GeneratorStage;
pub use lighting::FirstLightProcessor;
pub use opacity_index::{OpacityIndex, OpacityIndexError};
pub use processor::{BatchProcessor, GeneratorPipeline, StructureGate};
pub use world::{CubicWorld, LightType, WorldAccess, WorldHeight};
