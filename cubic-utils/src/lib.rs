//! # Cubic Utils
//!
//! Shared coordinate types, the cube address codec and small helpers used by
//! every crate in the workspace.

pub mod coords;
pub mod locks;
pub mod math;
mod types;

pub use coords::CubeAddress;
pub use types::{BlockPos, BlockStateId, ColumnPos, CubePos};
