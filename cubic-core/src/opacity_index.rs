//! Topmost light-blocking block tracking for a column.

use cubic_utils::coords::{MAX_BLOCK_Y, MIN_BLOCK_Y};
use thiserror::Error;

/// Number of (x, z) entries in a column.
const ENTRIES: usize = 16 * 16;

/// Serialized size of an index in bytes.
pub const OPACITY_INDEX_DATA_SIZE: usize = ENTRIES * size_of::<i32>();

/// Serialized marker for "no opaque block known".
const NONE_SENTINEL: i32 = i32::MIN;

/// Errors from reading a serialized [`OpacityIndex`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpacityIndexError {
    /// The buffer is not exactly [`OPACITY_INDEX_DATA_SIZE`] bytes.
    #[error("opacity index data must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// The required length.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },
    /// An entry holds a height outside the world.
    #[error("opacity index entry {index} has out of range height {y}")]
    HeightOutOfRange {
        /// Entry index, `z * 16 + x`.
        index: usize,
        /// The stored height.
        y: i32,
    },
}

/// Tracks the Y of the topmost opaque block for each of the 16x16 columns
/// of a cube column.
///
/// The index only knows what it has been told. Clearing the top block removes
/// the entry, and the caller supplies the next lower opaque block with another
/// [`OpacityIndex::set_opacity`] call.
///
/// Entries are stored in z-major order: `index = z * 16 + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityIndex {
    tops: Box<[Option<i32>; ENTRIES]>,
}

#[inline]
fn entry(local_x: usize, local_z: usize) -> usize {
    debug_assert!(local_x < 16 && local_z < 16, "Column coordinates must be 0-15");
    local_z * 16 + local_x
}

impl OpacityIndex {
    /// Creates an index with no opaque blocks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tops: Box::new([None; ENTRIES]),
        }
    }

    /// Creates an index from bytes produced by [`OpacityIndex::get_data`].
    pub fn from_data(data: &[u8]) -> Result<Self, OpacityIndexError> {
        let mut index = Self::new();
        index.read_data(data)?;
        Ok(index)
    }

    /// Records an opacity change at a block.
    ///
    /// An opaque block above the current top becomes the new top. Clearing the
    /// block that is the current top forgets the entry.
    ///
    /// # Panics
    /// Panics if `block_y` is outside the world.
    pub fn set_opacity(&mut self, local_x: usize, block_y: i32, local_z: usize, opacity: u8) {
        assert!(
            (MIN_BLOCK_Y..=MAX_BLOCK_Y).contains(&block_y),
            "block y {block_y} is outside the world"
        );
        let top = &mut self.tops[entry(local_x, local_z)];
        if opacity > 0 {
            if top.is_none_or(|y| block_y > y) {
                *top = Some(block_y);
            }
        } else if *top == Some(block_y) {
            *top = None;
        }
    }

    /// Returns 1 if the block is at or below the topmost opaque block, else 0.
    #[must_use]
    pub fn get_opacity(&self, local_x: usize, block_y: i32, local_z: usize) -> u8 {
        match self.tops[entry(local_x, local_z)] {
            Some(top) if block_y <= top => 1,
            _ => 0,
        }
    }

    /// Returns the Y of the topmost opaque block, if any.
    #[must_use]
    #[inline]
    pub fn get_skylight_block_y(&self, local_x: usize, local_z: usize) -> Option<i32> {
        self.tops[entry(local_x, local_z)]
    }

    /// Returns true if no column has an opaque block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tops.iter().all(Option::is_none)
    }

    /// Highest recorded top.
    #[must_use]
    pub fn heightmap_max(&self) -> Option<i32> {
        self.tops.iter().flatten().copied().max()
    }

    /// Serializes the index as 256 big-endian `i32`s, `i32::MIN` meaning none.
    #[must_use]
    pub fn get_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(OPACITY_INDEX_DATA_SIZE);
        for top in self.tops.iter() {
            out.extend_from_slice(&top.unwrap_or(NONE_SENTINEL).to_be_bytes());
        }
        out
    }

    /// Replaces the contents with serialized data.
    ///
    /// The index is left untouched if the data is malformed.
    pub fn read_data(&mut self, data: &[u8]) -> Result<(), OpacityIndexError> {
        if data.len() != OPACITY_INDEX_DATA_SIZE {
            return Err(OpacityIndexError::InvalidLength {
                expected: OPACITY_INDEX_DATA_SIZE,
                actual: data.len(),
            });
        }

        let mut tops = Box::new([None; ENTRIES]);
        let entries = data.chunks_exact(size_of::<i32>());
        for (index, (top, bytes)) in tops.iter_mut().zip(entries).enumerate() {
            let y = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            *top = match y {
                NONE_SENTINEL => None,
                y if (MIN_BLOCK_Y..=MAX_BLOCK_Y).contains(&y) => Some(y),
                y => return Err(OpacityIndexError::HeightOutOfRange { index, y }),
            };
        }

        self.tops = tops;
        Ok(())
    }
}

impl Default for OpacityIndex {
    fn default() -> Self {
        Self::new()
    }
}
