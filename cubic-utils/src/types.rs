//! Position newtypes, so a cube coordinate can't be passed where a block
//! coordinate is expected.

use crate::coords::{self, CUBE_SIZE};
use crate::math::{Vector2, Vector3};

/// A raw block state id. A block table maps it to its light properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockStateId(pub u16);

impl BlockStateId {
    /// The air block state.
    pub const AIR: Self = Self(0);
}

/// A block position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos(pub Vector3<i32>);

/// A cube position, one unit per 16 blocks on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubePos(pub Vector3<i32>);

/// A column position. `0.y` holds the world z coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnPos(pub Vector2<i32>);

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// Returns the position moved by the given offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// Returns the cube containing this block.
    #[must_use]
    pub const fn cube(self) -> CubePos {
        CubePos::new(
            coords::block_to_cube(self.0.x),
            coords::block_to_cube(self.0.y),
            coords::block_to_cube(self.0.z),
        )
    }

    /// Returns the position of this block inside its cube, each axis in `0..16`.
    #[must_use]
    pub const fn local(self) -> (usize, usize, usize) {
        (
            coords::block_to_local(self.0.x) as usize,
            coords::block_to_local(self.0.y) as usize,
            coords::block_to_local(self.0.z) as usize,
        )
    }
}

impl CubePos {
    /// Creates a cube position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The cube x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The cube y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The cube z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// Returns the neighbor cube at the given offset.
    #[must_use]
    pub const fn relative(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// Returns the cube directly below.
    #[must_use]
    pub const fn below(self) -> Self {
        self.relative(0, -1, 0)
    }

    /// Returns the cube directly above.
    #[must_use]
    pub const fn above(self) -> Self {
        self.relative(0, 1, 0)
    }

    /// Returns the column this cube belongs to.
    #[must_use]
    pub const fn column(self) -> ColumnPos {
        ColumnPos::new(self.0.x, self.0.z)
    }

    /// Lowest block position inside the cube.
    #[must_use]
    pub const fn min_block(self) -> BlockPos {
        BlockPos::new(
            coords::cube_to_min_block(self.0.x),
            coords::cube_to_min_block(self.0.y),
            coords::cube_to_min_block(self.0.z),
        )
    }

    /// Highest block position inside the cube.
    #[must_use]
    pub const fn max_block(self) -> BlockPos {
        BlockPos::new(
            coords::cube_to_max_block(self.0.x),
            coords::cube_to_max_block(self.0.y),
            coords::cube_to_max_block(self.0.z),
        )
    }

    /// Returns the world position of a block inside this cube.
    #[must_use]
    pub const fn block(self, local_x: usize, local_y: usize, local_z: usize) -> BlockPos {
        debug_assert!(local_x < CUBE_SIZE as usize);
        debug_assert!(local_y < CUBE_SIZE as usize);
        debug_assert!(local_z < CUBE_SIZE as usize);
        BlockPos::new(
            coords::local_to_block(self.0.x, local_x as i32),
            coords::local_to_block(self.0.y, local_y as i32),
            coords::local_to_block(self.0.z, local_z as i32),
        )
    }
}

impl ColumnPos {
    /// Creates a column position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The column x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The column z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }

    /// Returns the cube at `cube_y` in this column.
    #[must_use]
    pub const fn cube(self, cube_y: i32) -> CubePos {
        CubePos::new(self.0.x, cube_y, self.0.y)
    }
}
