//! Simulation statistics collection and reporting.
//!
//! This module tracks the cumulative counters each simulator exposes. It provides:
//! 1. **Cache:** Hit/miss counts, evictions and dirty write-backs.
//! 2. **Allocator:** Allocation and free counts, failures, splits and merges.
//! 3. **Translation:** TLB hits/misses, page walks and faults by kind.
//!
//! Counters only grow between resets. Simulators hand out shared references,
//! so callers read them but never mutate them.

use std::fmt;

/// Computes `part / whole` as a ratio in `[0, 1]`, or 0 when `whole` is zero.
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Cache simulator statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Accesses that found a valid line with a matching tag.
    pub hits: u64,
    /// Accesses that had to install a line.
    pub misses: u64,
    /// Misses that replaced a valid line.
    pub evictions: u64,
    /// Evictions of dirty lines.
    pub writebacks: u64,
}

impl CacheStats {
    /// Total number of accesses.
    pub const fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of accesses that hit, or 0 before the first access.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.accesses())
    }

    /// Fraction of accesses that missed, or 0 before the first access.
    pub fn miss_rate(&self) -> f64 {
        ratio(self.misses, self.accesses())
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accesses: {:<8} | hits: {:<8} | misses: {:<8} | evictions: {:<8} | miss_rate: {:.2}%",
            self.accesses(),
            self.hits,
            self.misses,
            self.evictions,
            self.miss_rate() * 100.0
        )
    }
}

/// Buddy allocator statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Successful frees.
    pub frees: u64,
    /// Allocation requests that returned an error.
    pub failed_allocations: u64,
    /// Free requests that returned an error.
    pub failed_frees: u64,
    /// Blocks split in half to satisfy a request.
    pub splits: u64,
    /// Buddy pairs merged back into their parent.
    pub merges: u64,
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocs: {} ({} failed) | frees: {} ({} failed) | splits: {} | merges: {}",
            self.allocations,
            self.failed_allocations,
            self.frees,
            self.failed_frees,
            self.splits,
            self.merges
        )
    }
}

/// Address translator statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TranslationStats {
    /// Translation requests, including failed ones.
    pub translations: u64,
    /// Requests served from the TLB.
    pub tlb_hits: u64,
    /// Requests that missed the TLB.
    pub tlb_misses: u64,
    /// Page-table entries probed across all walks.
    pub levels_walked: u64,
    /// Walks that ended in a page fault.
    pub page_faults: u64,
    /// Requests refused by a protection check.
    pub protection_faults: u64,
    /// Requests rejected for addressing bits above the layout width.
    pub out_of_range: u64,
}

impl TranslationStats {
    /// Number of TLB lookups performed.
    pub const fn tlb_lookups(&self) -> u64 {
        self.tlb_hits + self.tlb_misses
    }

    /// Fraction of TLB lookups that hit, or 0 before the first lookup.
    pub fn tlb_hit_rate(&self) -> f64 {
        ratio(self.tlb_hits, self.tlb_lookups())
    }
}

impl fmt::Display for TranslationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translations: {} | tlb hits: {} | tlb misses: {} | hit_rate: {:.2}%",
            self.translations,
            self.tlb_hits,
            self.tlb_misses,
            self.tlb_hit_rate() * 100.0,
        )?;
        write!(
            f,
            " | page faults: {} | protection faults: {}",
            self.page_faults, self.protection_faults
        )
    }
}
