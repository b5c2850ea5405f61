//! Cache Replacement Policies.
//!
//! Implements the algorithms for selecting victim lines in a full set.
//! Victim selection only runs when every way of the set is valid; empty ways
//! are always filled first by the cache itself.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out (age fixed at fill time).
//! - `Lru`: Least Recently Used (age refreshed on every hit).
//! - `Random`: Uniform selection from an injected random source.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Random replacement policy.
pub mod random;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use random::RandomPolicy;

use super::CacheLine;

/// Trait for cache replacement policies.
///
/// Every line carries a last-touched sequence number stamped by the cache.
/// A policy decides whether hits refresh that stamp and which way to evict.
pub trait ReplacementPolicy: Send + Sync {
    /// Short display name of the policy.
    fn name(&self) -> &'static str;

    /// Returns true if a hit should restamp the line with the current sequence number.
    fn refresh_on_hit(&self) -> bool;

    /// Selects the way to evict from a full set.
    ///
    /// # Arguments
    ///
    /// * `lines` - The lines of the set, indexed by way. Never empty.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn get_victim(&mut self, lines: &[CacheLine]) -> usize;

    /// Restores the policy to its freshly constructed state.
    fn reset(&mut self) {}
}

/// Returns the way with the smallest sequence number, preferring the lowest way on ties.
pub(crate) fn oldest_way(lines: &[CacheLine]) -> usize {
    lines
        .iter()
        .enumerate()
        .min_by_key(|(_, line)| line.last_touched())
        .map_or(0, |(way, _)| way)
}
