//! Tunable search parameters.

use std::time::Duration;

/// Configuration for a [`Searcher`](crate::Searcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Result cache capacity in entries. 0 disables the cache.
    pub cache_capacity: usize,
    /// Maximum number of positions kept by the position cache.
    pub position_cache_capacity: usize,
    /// Half-width of the aspiration window, in centipawns.
    pub aspiration_window: i32,
    /// Multiplier applied to the failing side of the window on re-search.
    pub aspiration_factor: i32,
    /// Cadence of periodic progress reports.
    pub report_interval: Duration,
    /// The clock is consulted once every this many nodes.
    pub clock_poll_nodes: u64,
    /// Depth used when the caller gives none.
    pub max_depth: u8,
}

impl SearchConfig {
    /// Approximate bytes used by one result cache entry (map slot plus log slot).
    pub const CACHE_ENTRY_BYTES: usize = 96;

    /// Convert a size in megabytes to a result cache capacity.
    pub fn cache_entries_for_mb(mb: usize) -> usize {
        mb.saturating_mul(1024 * 1024) / Self::CACHE_ENTRY_BYTES
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 200_000,
            position_cache_capacity: 4_096,
            aspiration_window: 150,
            aspiration_factor: 2,
            report_interval: Duration::from_secs(1),
            clock_poll_nodes: 2048,
            max_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megabytes_scale_linearly() {
        let one = SearchConfig::cache_entries_for_mb(1);
        assert!(one > 0);
        assert!(SearchConfig::cache_entries_for_mb(16) >= one * 16);
        assert_eq!(SearchConfig::cache_entries_for_mb(0), 0);
    }
}
