//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the oldest line in a set, regardless of how recently it
//! was accessed. Lines are stamped once, when they are filled; hits leave the
//! stamp alone, so the smallest stamp marks the line that arrived first.
//!
//! # Performance
//!
//! - **Time Complexity:** `get_victim()` is O(W) where W is the associativity
//! - **Space Complexity:** one sequence number per line, stored in the line itself
//! - **Best Case:** Streaming accesses where all lines have equal importance
//! - **Worst Case:** Workloads with strong temporal locality (may evict frequently-used lines)

use super::{ReplacementPolicy, oldest_way};
use crate::cache::CacheLine;

/// FIFO policy. Stateless: insertion order lives in the line stamps.
#[derive(Clone, Copy, Debug, Default)]
pub struct FifoPolicy;

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    /// Hits do not change insertion order.
    fn refresh_on_hit(&self) -> bool {
        false
    }

    /// Returns the way that was filled first.
    fn get_victim(&mut self, lines: &[CacheLine]) -> usize {
        oldest_way(lines)
    }
}
