//! Opportunistic store of full positions keyed by hash.
//!
//! Contract: any entry may disappear at any time. Callers must treat every
//! read as possibly absent and be able to rebuild the position themselves.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;
use warden_core::Position;

/// Bounded `hash -> position` map. When full, the next insert drops everything.
pub struct PositionCache<P> {
    positions: HashMap<u64, P>,
    capacity: usize,
}

impl<P: Position> PositionCache<P> {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: HashMap::new(),
            capacity,
        }
    }

    /// The cached position for `hash`, if still held.
    ///
    /// Both hashes are checked so an aliased entry is never returned.
    pub fn get(&self, hash: u64, hash2: u64) -> Option<&P> {
        self.positions.get(&hash).filter(|p| p.hash2() == hash2)
    }

    /// Keep a copy of `pos`.
    pub fn insert(&mut self, pos: P) {
        if self.capacity == 0 {
            return;
        }
        if self.positions.len() >= self.capacity && !self.positions.contains_key(&pos.hash()) {
            debug!(capacity = self.capacity, "position cache full, dropping all entries");
            self.positions.clear();
        }
        self.positions.insert(pos.hash(), pos);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<P> fmt::Debug for PositionCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionCache")
            .field("len", &self.positions.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
