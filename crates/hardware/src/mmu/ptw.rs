//! Page Table Walker (PTW).
//!
//! Walks the multi-level table from the root to the leaf for one virtual
//! address, fabricating entries through the table's policy as they are first
//! reached. The walk stops at the first invalid entry.

use tracing::trace;

use super::layout::AddressLayout;
use super::page_table::{EntryProbe, PageTable, PageTableEntry, PageTablePolicy};
use crate::common::{TranslationFault, VirtAddr};

/// One level of a completed walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkStep {
    /// Level of the probed entry (0 = root).
    pub level: usize,
    /// Index of the entry within its table.
    pub index: u64,
    /// Frame the entry points at.
    pub frame: u64,
}

/// Result of a successful walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWalk {
    /// Entries probed, root first.
    pub steps: Vec<WalkStep>,
    /// The leaf entry as read during the walk.
    pub entry: PageTableEntry,
}

/// Performs a page table walk for `vaddr`.
///
/// The address must already be within the layout's width.
///
/// # Errors
///
/// Returns [`TranslationFault::PageFault`] naming the level of the first
/// invalid entry. No partial walk is returned.
pub fn page_table_walk(
    layout: &AddressLayout,
    table: &mut PageTable,
    policy: &mut dyn PageTablePolicy,
    vaddr: VirtAddr,
) -> Result<PageWalk, TranslationFault> {
    let vpn = layout.vpn(vaddr);
    let last = layout.levels() - 1;
    let mut steps = Vec::with_capacity(layout.levels());
    let mut leaf = None;

    for level in 0..layout.levels() {
        let probe = EntryProbe {
            level,
            index: layout.level_index(vpn, level),
            path: layout.table_path(vpn, level),
            span_bits: layout.span_bits(level),
            vpn,
            leaf: level == last,
        };
        let entry = table.probe(&probe, policy);
        trace!(%vaddr, level, index = probe.index, valid = entry.valid, "walk step");

        if !entry.valid {
            return Err(TranslationFault::PageFault { vaddr, level });
        }

        steps.push(WalkStep {
            level,
            index: probe.index,
            frame: entry.frame,
        });
        leaf = Some(entry);
    }

    match leaf {
        Some(entry) => Ok(PageWalk { steps, entry }),
        None => Err(TranslationFault::PageFault { vaddr, level: 0 }),
    }
}
