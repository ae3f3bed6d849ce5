//! Cube address codec and block/cube coordinate conversions.
//!
//! A cube address packs `(cube_x, cube_y, cube_z)` into one `i64` so it can be
//! used as a cheap key in caches and work queues. The layout, from the most
//! significant bit down, is 22 bits of x, 22 bits of z and 20 bits of y, each
//! stored as two's complement.

use crate::math::Vector3;
use crate::types::CubePos;

/// Edge length of a cube in blocks.
pub const CUBE_SIZE: i32 = 16;

/// Number of blocks in a cube.
pub const CUBE_VOLUME: usize = 16 * 16 * 16;

const Y_BITS: u32 = 20;
const XZ_BITS: u32 = 22;

const Y_MASK: i64 = (1 << Y_BITS) - 1;
const XZ_MASK: i64 = (1 << XZ_BITS) - 1;

/// Lowest cube x/z coordinate an address can hold.
pub const MIN_CUBE_XZ: i32 = -(1 << (XZ_BITS - 1));
/// Highest cube x/z coordinate an address can hold.
pub const MAX_CUBE_XZ: i32 = (1 << (XZ_BITS - 1)) - 1;
/// Lowest cube y coordinate an address can hold.
pub const MIN_CUBE_Y: i32 = -(1 << (Y_BITS - 1));
/// Highest cube y coordinate an address can hold.
pub const MAX_CUBE_Y: i32 = (1 << (Y_BITS - 1)) - 1;

/// Lowest block y coordinate in the world.
pub const MIN_BLOCK_Y: i32 = MIN_CUBE_Y * CUBE_SIZE;
/// Highest block y coordinate in the world.
pub const MAX_BLOCK_Y: i32 = MAX_CUBE_Y * CUBE_SIZE + (CUBE_SIZE - 1);

/// Returns the lowest block coordinate inside the cube coordinate `cube`.
#[inline]
#[must_use]
pub const fn cube_to_min_block(cube: i32) -> i32 {
    cube * CUBE_SIZE
}

/// Returns the highest block coordinate inside the cube coordinate `cube`.
#[inline]
#[must_use]
pub const fn cube_to_max_block(cube: i32) -> i32 {
    cube * CUBE_SIZE + (CUBE_SIZE - 1)
}

/// Returns the position of a block inside its cube, always in `0..16`.
#[inline]
#[must_use]
pub const fn block_to_local(block: i32) -> i32 {
    block.rem_euclid(CUBE_SIZE)
}

/// Returns the cube coordinate containing the block coordinate `block`.
#[inline]
#[must_use]
pub const fn block_to_cube(block: i32) -> i32 {
    block >> 4
}

/// Returns the block coordinate of `local` inside the cube coordinate `cube`.
#[inline]
#[must_use]
pub const fn local_to_block(cube: i32, local: i32) -> i32 {
    cube * CUBE_SIZE + local
}

/// Returns true if the cube coordinates fit in a packed address.
#[inline]
#[must_use]
pub const fn is_addressable(x: i32, y: i32, z: i32) -> bool {
    x >= MIN_CUBE_XZ
        && x <= MAX_CUBE_XZ
        && z >= MIN_CUBE_XZ
        && z <= MAX_CUBE_XZ
        && y >= MIN_CUBE_Y
        && y <= MAX_CUBE_Y
}

/// A packed cube coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeAddress(pub i64);

impl CubeAddress {
    /// Packs cube coordinates into an address.
    ///
    /// # Panics
    /// Panics if a coordinate is outside the addressable range. That is a
    /// caller bug, wrapping silently would alias another cube.
    #[must_use]
    pub fn pack(x: i32, y: i32, z: i32) -> Self {
        assert!(
            is_addressable(x, y, z),
            "cube ({x}, {y}, {z}) is outside the addressable range"
        );
        let x = i64::from(x) & XZ_MASK;
        let z = i64::from(z) & XZ_MASK;
        let y = i64::from(y) & Y_MASK;
        Self((x << (XZ_BITS + Y_BITS)) | (z << Y_BITS) | y)
    }

    /// Unpacks the address into `(x, y, z)` cube coordinates.
    #[must_use]
    pub const fn unpack(self) -> (i32, i32, i32) {
        let key = self.0;
        let x = (key >> (XZ_BITS + Y_BITS)) as i32;
        let z = ((key << XZ_BITS) >> (XZ_BITS + Y_BITS)) as i32;
        let y = ((key << (64 - Y_BITS)) >> (64 - Y_BITS)) as i32;
        (x, y, z)
    }

    /// Returns the cube position this address refers to.
    #[must_use]
    pub const fn pos(self) -> CubePos {
        let (x, y, z) = self.unpack();
        CubePos(Vector3::new(x, y, z))
    }
}

impl From<CubePos> for CubeAddress {
    fn from(pos: CubePos) -> Self {
        Self::pack(pos.0.x, pos.0.y, pos.0.z)
    }
}

impl From<CubeAddress> for CubePos {
    fn from(address: CubeAddress) -> Self {
        address.pos()
    }
}
