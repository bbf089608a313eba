//! Bounded result cache (transposition table).
//!
//! Entries are keyed by the primary hash and verified against the secondary
//! hash stored inside the [`AnalysisResult`]. A mismatch is a collision: the
//! entry is treated as absent and silently replaced by the next store.
//!
//! Eviction is insertion-order FIFO. Overwriting a key keeps its original
//! slot in the insertion log, so a frequently refreshed entry still ages out.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::debug;
use warden_core::Move;

use crate::analysis::{AnalysisResult, score_from_cache, score_to_cache};

/// Value stored per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Score is node-relative for mates (see [`score_to_cache`]).
    pub result: AnalysisResult,
    /// Best move found for the position, used only as an ordering hint.
    pub best_move: Option<Move>,
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Probes that found the primary key but failed verification.
    pub collisions: u64,
    pub stores: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of probes that hit, in permille.
    pub fn hit_permille(&self) -> u64 {
        let probes = self.hits + self.misses + self.collisions;
        if probes == 0 { 0 } else { self.hits * 1000 / probes }
    }
}

/// Capacity-bounded map from position hash to analysis result.
pub struct ResultCache {
    entries: HashMap<u64, CacheEntry>,
    order: VecDeque<u64>,
    capacity: usize,
    stats: CacheStats,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` entries. 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        let reserve = capacity.min(1 << 16);
        Self {
            entries: HashMap::with_capacity(reserve),
            order: VecDeque::with_capacity(reserve),
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats = CacheStats::default();
    }

    /// Change the capacity, evicting the oldest entries if it shrank.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.evict_oldest();
        }
        debug!(capacity, len = self.entries.len(), "result cache resized");
    }

    /// Look up a position.
    ///
    /// `ply` is the distance from the search root; mate scores are converted
    /// back to root-relative form.
    pub fn probe(&mut self, hash: u64, hash2: u64, ply: usize) -> Option<CacheEntry> {
        match self.entries.get(&hash) {
            Some(entry) if entry.result.verification_hash == hash2 => {
                self.stats.hits += 1;
                let mut found = *entry;
                found.result.score = score_from_cache(found.result.score, ply);
                Some(found)
            }
            Some(_) => {
                self.stats.collisions += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Like [`probe`](Self::probe) but leaves the counters alone.
    pub fn peek(&self, hash: u64, hash2: u64, ply: usize) -> Option<CacheEntry> {
        self.entries
            .get(&hash)
            .filter(|e| e.result.verification_hash == hash2)
            .map(|e| {
                let mut found = *e;
                found.result.score = score_from_cache(found.result.score, ply);
                found
            })
    }

    /// Store a result computed at `ply` from the root.
    pub fn store(&mut self, hash: u64, result: AnalysisResult, best_move: Option<Move>, ply: usize) {
        if self.capacity == 0 {
            return;
        }
        let mut result = result;
        result.score = score_to_cache(result.score, ply);
        let entry = CacheEntry { result, best_move };
        self.stats.stores += 1;

        if let Some(slot) = self.entries.get_mut(&hash) {
            *slot = entry;
            return;
        }
        while self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(hash, entry);
        self.order.push_back(hash);
    }

    /// Counters since creation or the last [`clear`](Self::clear).
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(200_000)
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}
