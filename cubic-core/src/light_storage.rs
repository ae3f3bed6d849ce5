//! Nibble storage for one light channel of a cube.
//!
//! Each of the 4096 voxels holds a 4-bit level, two per byte.

/// Bytes needed for one 16x16x16 light channel.
pub const LIGHT_ARRAY_SIZE: usize = 2048;

/// Highest light level.
pub const MAX_LIGHT: u8 = 15;

/// One light channel of a cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightStorage {
    /// Every voxel has the same level.
    Uniform(u8),
    /// Per-voxel levels packed as nibbles, low nibble first.
    Packed(Box<[u8; LIGHT_ARRAY_SIZE]>),
}

#[inline]
fn nibble_slot(x: usize, y: usize, z: usize) -> (usize, u32) {
    debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
    let voxel = (y << 8) | (z << 4) | x;
    (voxel >> 1, ((voxel & 1) as u32) * 4)
}

#[inline]
const fn splat(level: u8) -> u8 {
    (level & 0x0F) | ((level & 0x0F) << 4)
}

impl LightStorage {
    /// Creates a fully dark channel.
    #[must_use]
    pub fn dark() -> Self {
        Self::Uniform(0)
    }

    /// Returns the level at a local position.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        match self {
            Self::Uniform(level) => *level,
            Self::Packed(data) => {
                let (byte, shift) = nibble_slot(x, y, z);
                (data[byte] >> shift) & 0x0F
            }
        }
    }

    /// Sets the level at a local position, returning the previous level.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, level: u8) -> u8 {
        debug_assert!(level <= MAX_LIGHT, "Light level must be 0-15");
        let (byte, shift) = nibble_slot(x, y, z);

        if let Self::Uniform(current) = *self {
            if current == level {
                return current;
            }
            *self = Self::Packed(Box::new([splat(current); LIGHT_ARRAY_SIZE]));
        }

        let Self::Packed(data) = self else {
            unreachable!("uniform storage was just expanded");
        };
        let previous = (data[byte] >> shift) & 0x0F;
        data[byte] = (data[byte] & !(0x0F << shift)) | ((level & 0x0F) << shift);
        previous
    }

    /// Resets every voxel to `level`.
    pub fn fill(&mut self, level: u8) {
        debug_assert!(level <= MAX_LIGHT, "Light level must be 0-15");
        *self = Self::Uniform(level);
    }
}

impl Default for LightStorage {
    fn default() -> Self {
        Self::dark()
    }
}
