use std::collections::VecDeque;

use cubic_utils::{CubeAddress, CubePos};
use rustc_hash::FxHashSet;

/// FIFO set of cube addresses waiting to be processed.
///
/// Adding an address that is already queued keeps its original position.
#[derive(Debug, Default)]
pub struct PendingCubes {
    queue: VecDeque<CubeAddress>,
    queued: FxHashSet<CubeAddress>,
}

impl PendingCubes {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a cube. Returns false if it was already queued.
    pub fn add(&mut self, pos: CubePos) -> bool {
        self.add_address(CubeAddress::from(pos))
    }

    /// Queues a packed cube address. Returns false if it was already queued.
    pub fn add_address(&mut self, address: CubeAddress) -> bool {
        if !self.queued.insert(address) {
            return false;
        }
        self.queue.push_back(address);
        true
    }

    /// Removes the oldest address.
    pub fn pop(&mut self) -> Option<CubeAddress> {
        let address = self.queue.pop_front()?;
        self.queued.remove(&address);
        Some(address)
    }

    /// Returns true if `pos` is queued.
    #[must_use]
    pub fn contains(&self, pos: CubePos) -> bool {
        self.queued.contains(&CubeAddress::from(pos))
    }

    /// Number of queued addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every queued address.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }
}
