//! Sparse, lazily fabricated multi-level page table.
//!
//! The table never materializes the full tree. Each entry is keyed by its level
//! and its VPN prefix (the path of indices from the root down to and including
//! the entry's own index) and is created the first time a walk probes it. A
//! [`PageTablePolicy`] decides what a fabricated entry looks like; once an
//! entry exists its validity never changes for the life of the table.

use std::collections::BTreeMap;

use tracing::trace;

use crate::common::Protection;

/// Identity of a page-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PteKey {
    /// Level of the entry (0 = root).
    pub level: usize,
    /// VPN prefix through this level's index.
    pub path: u64,
}

/// A page-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTableEntry {
    /// Index of the entry within its table.
    pub index: u64,
    /// Next-level table frame, or the data frame at the leaf level. Meaningful only if valid.
    pub frame: u64,
    /// Entry validity flag.
    pub valid: bool,
    /// Set the first time a translation completes through this entry.
    pub accessed: bool,
    /// Set when a write completes through this leaf entry.
    pub dirty: bool,
    /// Permissions granted by the entry.
    pub protection: Protection,
}

/// Everything a policy knows about the entry it is asked to fabricate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryProbe {
    /// Level of the entry (0 = root).
    pub level: usize,
    /// Index of the entry within its table.
    pub index: u64,
    /// VPN prefix through this level's index.
    pub path: u64,
    /// Number of VPN bits below this entry (0 at the leaf level).
    pub span_bits: u32,
    /// Full VPN of the address whose walk triggered the probe.
    pub vpn: u64,
    /// True at the last level, where the entry maps a data page.
    pub leaf: bool,
}

impl EntryProbe {
    /// Inclusive range of VPNs whose walks pass through this entry.
    pub const fn vpn_range(&self) -> (u64, u64) {
        let below = crate::common::low_mask(self.span_bits);
        let first = match self.path.checked_shl(self.span_bits) {
            Some(first) => first,
            None => 0,
        };
        (first, first | below)
    }
}

/// The contents a policy chooses for a fabricated entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntrySpec {
    /// Whether the entry is present.
    pub valid: bool,
    /// Frame the entry points at.
    pub frame: u64,
    /// Permissions granted by the entry.
    pub protection: Protection,
}

impl EntrySpec {
    /// A not-present entry.
    pub const fn invalid() -> Self {
        Self {
            valid: false,
            frame: 0,
            protection: Protection::NONE,
        }
    }

    /// A present entry pointing at `frame` with `protection`.
    pub const fn mapped(frame: u64, protection: Protection) -> Self {
        Self {
            valid: true,
            frame,
            protection,
        }
    }
}

/// Decides the contents of page-table entries as walks first reach them.
///
/// Implementations range from fully deterministic fixtures for tests to
/// randomized tables for demonstrations. The table calls
/// [`fabricate`](Self::fabricate) at most once per entry.
pub trait PageTablePolicy {
    /// Chooses the contents of the entry described by `probe`.
    fn fabricate(&mut self, probe: &EntryProbe) -> EntrySpec;

    /// Restores the policy to its freshly constructed state.
    fn reset(&mut self) {}
}

/// Sparse map from entry identity to entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageTable {
    entries: BTreeMap<PteKey, PageTableEntry>,
}

impl PageTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry at `key`, if it has been fabricated.
    pub fn get(&self, key: &PteKey) -> Option<&PageTableEntry> {
        self.entries.get(key)
    }

    /// Returns the entry described by `probe`, fabricating it on first use.
    pub fn probe(
        &mut self,
        probe: &EntryProbe,
        policy: &mut dyn PageTablePolicy,
    ) -> PageTableEntry {
        let key = PteKey {
            level: probe.level,
            path: probe.path,
        };
        *self.entries.entry(key).or_insert_with(|| {
            let spec = policy.fabricate(probe);
            trace!(
                level = probe.level,
                index = probe.index,
                valid = spec.valid,
                frame = spec.frame,
                "pte fabricated"
            );
            PageTableEntry {
                index: probe.index,
                frame: spec.frame,
                valid: spec.valid,
                accessed: false,
                dirty: false,
                protection: spec.protection,
            }
        })
    }

    /// Sets the accessed flag (and dirty flag when `dirty`) of an existing entry.
    pub(crate) fn touch(&mut self, key: &PteKey, dirty: bool) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.accessed = true;
            entry.dirty |= dirty;
        }
    }

    /// All fabricated entries in key order (by level, then path).
    pub fn entries(&self) -> impl Iterator<Item = (&PteKey, &PageTableEntry)> + '_ {
        self.entries.iter()
    }

    /// Fabricated entries of one level, in path order.
    pub fn level(&self, level: usize) -> impl Iterator<Item = (&PteKey, &PageTableEntry)> + '_ {
        self.entries.iter().filter(move |(key, _)| key.level == level)
    }

    /// Number of fabricated entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entry has been fabricated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards every fabricated entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
