//! Page-table fabrication policies.
//!
//! Each policy implements [`PageTablePolicy`] and decides the contents of an
//! entry the first time a walk reaches it:
//! 1. **DemandPaging:** every entry valid, frames handed out sequentially.
//! 2. **FixedMappings:** explicit VPN to frame map; unmapped pages fault.
//! 3. **RandomFixture:** seeded coin flips for validity and frames.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::page_table::{EntryProbe, EntrySpec, PageTablePolicy};
use crate::common::Protection;

/// Maps every page on first touch.
///
/// Table and data frames share one sequential counter starting at
/// `base_frame`, so frame numbers reflect the order entries were first probed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemandPaging {
    base_frame: u64,
    next_frame: u64,
    leaf_protection: Protection,
}

impl DemandPaging {
    /// Hands out frames from `base_frame` upward with read/write leaves.
    pub const fn new(base_frame: u64) -> Self {
        Self {
            base_frame,
            next_frame: base_frame,
            leaf_protection: Protection::READ_WRITE,
        }
    }

    /// Uses `protection` for every leaf entry.
    #[must_use]
    pub const fn with_protection(mut self, protection: Protection) -> Self {
        self.leaf_protection = protection;
        self
    }

    /// Frame the next fabricated entry will receive.
    pub const fn next_frame(&self) -> u64 {
        self.next_frame
    }
}

impl Default for DemandPaging {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PageTablePolicy for DemandPaging {
    fn fabricate(&mut self, probe: &EntryProbe) -> EntrySpec {
        let frame = self.next_frame;
        self.next_frame = self.next_frame.wrapping_add(1);
        let protection = if probe.leaf {
            self.leaf_protection
        } else {
            Protection::ALL
        };
        EntrySpec::mapped(frame, protection)
    }

    fn reset(&mut self) {
        self.next_frame = self.base_frame;
    }
}

/// Deterministic table built from an explicit VPN map.
///
/// A leaf is valid iff its VPN is mapped. An intermediate entry is valid iff
/// at least one mapped VPN lies beneath it; intermediate tables take frames
/// from a counter starting at the table base.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedMappings {
    mappings: BTreeMap<u64, (u64, Protection)>,
    table_base: u64,
    next_table: u64,
}

impl FixedMappings {
    /// Creates an empty map; every address faults at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers intermediate table frames from `base`.
    #[must_use]
    pub fn with_table_base(mut self, base: u64) -> Self {
        self.table_base = base;
        self.next_table = base;
        self
    }

    /// Adds a mapping and returns the policy (builder form of [`insert`](Self::insert)).
    #[must_use]
    pub fn map(mut self, vpn: u64, frame: u64, protection: Protection) -> Self {
        let _ = self.insert(vpn, frame, protection);
        self
    }

    /// Maps `vpn` to `frame`; returns the previous mapping, if any.
    ///
    /// Entries already fabricated by a translator are not revisited. The map
    /// does not know the translator's layout: a `vpn` wider than the layout's
    /// VPN field is stored as given and never matched, so addresses whose low
    /// bits coincide still fault.
    pub fn insert(
        &mut self,
        vpn: u64,
        frame: u64,
        protection: Protection,
    ) -> Option<(u64, Protection)> {
        self.mappings.insert(vpn, (frame, protection))
    }

    /// The mapping for `vpn`, if any.
    pub fn get(&self, vpn: u64) -> Option<(u64, Protection)> {
        self.mappings.get(&vpn).copied()
    }

    /// Number of mapped pages.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if no page is mapped.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl PageTablePolicy for FixedMappings {
    fn fabricate(&mut self, probe: &EntryProbe) -> EntrySpec {
        if probe.leaf {
            return match self.mappings.get(&probe.path) {
                Some(&(frame, protection)) => EntrySpec::mapped(frame, protection),
                None => EntrySpec::invalid(),
            };
        }

        let (first, last) = probe.vpn_range();
        if self.mappings.range(first..=last).next().is_none() {
            return EntrySpec::invalid();
        }
        let frame = self.next_table;
        self.next_table = self.next_table.wrapping_add(1);
        EntrySpec::mapped(frame, Protection::ALL)
    }

    fn reset(&mut self) {
        self.next_table = self.table_base;
    }
}

/// Randomized table for demonstrations.
///
/// Each fabricated entry is invalid with probability `fault_rate`; valid
/// entries point at a frame drawn uniformly from `0..frame_pool`. The
/// generator is seeded, so a given seed always builds the same table for the
/// same access sequence.
#[derive(Clone, Debug)]
pub struct RandomFixture {
    seed: u64,
    rng: StdRng,
    fault_rate: f64,
    frame_pool: u64,
    leaf_protection: Protection,
}

impl RandomFixture {
    /// Creates a fixture with the given seed, fault probability and frame pool.
    ///
    /// The probability is clamped to `[0, 1]` (NaN counts as 0) and an empty
    /// pool is widened to one frame.
    pub fn new(seed: u64, fault_rate: f64, frame_pool: u64) -> Self {
        let fault_rate = if fault_rate.is_nan() {
            0.0
        } else {
            fault_rate.clamp(0.0, 1.0)
        };
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            fault_rate,
            frame_pool: frame_pool.max(1),
            leaf_protection: Protection::READ_WRITE,
        }
    }

    /// Uses `protection` for every valid leaf entry.
    #[must_use]
    pub fn with_protection(mut self, protection: Protection) -> Self {
        self.leaf_protection = protection;
        self
    }

    /// Probability that a fabricated entry is invalid.
    pub const fn fault_rate(&self) -> f64 {
        self.fault_rate
    }

    /// Number of distinct frames valid entries may point at.
    pub const fn frame_pool(&self) -> u64 {
        self.frame_pool
    }
}

impl PageTablePolicy for RandomFixture {
    fn fabricate(&mut self, probe: &EntryProbe) -> EntrySpec {
        if self.rng.gen_bool(self.fault_rate) {
            return EntrySpec::invalid();
        }
        let frame = self.rng.gen_range(0..self.frame_pool);
        let protection = if probe.leaf {
            self.leaf_protection
        } else {
            Protection::ALL
        };
        EntrySpec::mapped(frame, protection)
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
