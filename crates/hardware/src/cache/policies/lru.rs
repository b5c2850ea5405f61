//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the cache line that has not been accessed for the longest
//! time. The cache stamps a line with a fresh sequence number on fill and on
//! every hit, so the smallest stamp in a set marks the LRU line.
//!
//! # Performance
//!
//! - **Time Complexity:** `get_victim()` is O(W) where W is the associativity
//! - **Space Complexity:** one sequence number per line, stored in the line itself
//! - **Best Case:** Workloads with strong temporal locality
//! - **Worst Case:** Cyclic scans one line larger than the set (every access misses)

use super::{ReplacementPolicy, oldest_way};
use crate::cache::CacheLine;

/// LRU policy. Stateless: recency lives in the line stamps.
#[derive(Clone, Copy, Debug, Default)]
pub struct LruPolicy;

impl LruPolicy {
    /// Creates a new LRU policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReplacementPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "LRU"
    }

    /// Hits move the line to the most-recently-used position.
    fn refresh_on_hit(&self) -> bool {
        true
    }

    /// Returns the way with the oldest access stamp.
    fn get_victim(&mut self, lines: &[CacheLine]) -> usize {
        oldest_way(lines)
    }
}
