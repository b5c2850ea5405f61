//! Translation Lookaside Buffer (TLB).
//!
//! A small, fully associative cache of recent translations. It stores the
//! mapping between Virtual Page Numbers (VPN) and physical frame numbers,
//! along with the protection bits of the page so a hit can be checked without
//! a walk.
//!
//! The TLB has a fixed number of slots. A fill uses an invalid slot when one
//! exists and otherwise evicts by the configured [`TlbPolicy`]: insertion order
//! for FIFO, last use for LRU.

use tracing::debug;

use crate::common::Protection;
use crate::config::TlbPolicy;

/// A single entry in the TLB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TlbEntry {
    /// Virtual Page Number (Tag).
    pub vpn: u64,
    /// Physical frame number (Data).
    pub frame: u64,
    /// Entry validity flag.
    pub valid: bool,
    /// Permissions of the mapped page.
    pub protection: Protection,
    /// Sequence number of the fill.
    pub inserted: u64,
    /// Sequence number of the most recent fill or hit.
    pub last_used: u64,
}

/// Translation Lookaside Buffer structure.
#[derive(Clone, Debug)]
pub struct Tlb {
    /// Fixed slots; invalid slots are free.
    entries: Vec<TlbEntry>,
    /// Victim selection rule for a full TLB.
    policy: TlbPolicy,
    /// Monotonic sequence counter for fill and use stamps.
    clock: u64,
}

impl Tlb {
    /// Creates an empty TLB with `capacity` slots (at least one).
    pub fn new(capacity: usize, policy: TlbPolicy) -> Self {
        Self {
            entries: vec![TlbEntry::default(); capacity.max(1)],
            policy,
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Looks up a VPN, refreshing the entry's use stamp on a hit.
    ///
    /// # Returns
    ///
    /// A copy of the matching valid entry, or `None` on a miss.
    pub fn lookup(&mut self, vpn: u64) -> Option<TlbEntry> {
        let stamp = self.tick();
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.valid && entry.vpn == vpn)?;
        entry.last_used = stamp;
        Some(*entry)
    }

    /// Looks up a VPN without touching replacement state.
    pub fn peek(&self, vpn: u64) -> Option<&TlbEntry> {
        self.entries
            .iter()
            .find(|entry| entry.valid && entry.vpn == vpn)
    }

    /// Inserts a new mapping into the TLB.
    ///
    /// An existing entry for the same VPN is overwritten in place. Otherwise an
    /// invalid slot is used, or a victim is chosen by policy.
    ///
    /// # Returns
    ///
    /// The valid entry that was evicted to make room, if any.
    pub fn insert(&mut self, vpn: u64, frame: u64, protection: Protection) -> Option<TlbEntry> {
        let stamp = self.tick();
        let slot = self
            .entries
            .iter()
            .position(|entry| entry.valid && entry.vpn == vpn)
            .or_else(|| self.entries.iter().position(|entry| !entry.valid))
            .unwrap_or_else(|| self.victim());

        let old = self.entries[slot];
        let evicted = (old.valid && old.vpn != vpn).then_some(old);
        if let Some(victim) = &evicted {
            debug!(
                victim_vpn = victim.vpn,
                vpn,
                slot,
                policy = ?self.policy,
                "tlb eviction"
            );
        }
        debug!(vpn, frame, slot, "tlb fill");

        self.entries[slot] = TlbEntry {
            vpn,
            frame,
            valid: true,
            protection,
            inserted: stamp,
            last_used: stamp,
        };
        evicted
    }

    /// Slot to evict from a full TLB.
    fn victim(&self) -> usize {
        let key = |entry: &TlbEntry| match self.policy {
            TlbPolicy::Fifo => entry.inserted,
            TlbPolicy::Lru => entry.last_used,
        };
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| key(entry))
            .map_or(0, |(slot, _)| slot)
    }

    /// Invalidates the entry for `vpn`. Returns true if one was present.
    pub fn invalidate(&mut self, vpn: u64) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.valid && entry.vpn == vpn)
        {
            Some(entry) => {
                entry.valid = false;
                true
            }
            None => false,
        }
    }

    /// Invalidates every entry and restarts the sequence counter.
    pub fn flush(&mut self) {
        self.entries.fill(TlbEntry::default());
        self.clock = 0;
    }

    /// All slots, including invalid ones, in slot order.
    pub fn entries(&self) -> &[TlbEntry] {
        &self.entries
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.valid).count()
    }

    /// Returns true if no entry is valid.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Replacement policy in effect.
    pub const fn policy(&self) -> TlbPolicy {
        self.policy
    }
}
