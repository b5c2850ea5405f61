//! Address translation.
//!
//! This module implements a multi-level virtual-to-physical address translator
//! with a Translation Lookaside Buffer (TLB) in front of a lazily fabricated
//! page table, and an optional NUMA latency model.
//!
//! Each translation follows the same state machine:
//!
//! ```text
//!  CheckTLB --hit--> Done
//!     |
//!    miss
//!     v
//!  WalkLevel(0) -> WalkLevel(1) -> ... -> WalkLevel(N-1) -> Done
//!     |               |                        |
//!     +------ invalid entry at any level ------+--> PageFault
//! ```

/// Virtual address layout and per-level decomposition.
pub mod layout;

/// NUMA frame placement and latency model.
pub mod numa;

/// Sparse page table and the fabrication policy trait.
pub mod page_table;

/// Provided page-table fabrication policies.
pub mod policies;

/// Page table walker.
pub mod ptw;

/// Translation Lookaside Buffer (TLB) for caching virtual-to-physical translations.
pub mod tlb;

use std::fmt;

use tracing::{debug, trace};

use self::layout::AddressLayout;
use self::numa::NumaModel;
use self::page_table::{PageTable, PageTablePolicy, PteKey};
use self::ptw::page_table_walk;
use self::tlb::{Tlb, TlbEntry};
use crate::common::{AccessType, ConfigError, PhysAddr, Protection, TranslationFault, VirtAddr};
use crate::config::TranslatorConfig;
use crate::stats::TranslationStats;

pub use self::ptw::WalkStep;

/// Outcome of a successful translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    /// The translated virtual address.
    pub vaddr: VirtAddr,
    /// The resulting physical address.
    pub paddr: PhysAddr,
    /// Virtual page number of `vaddr`.
    pub vpn: u64,
    /// Physical frame number the page maps to.
    pub frame: u64,
    /// Byte offset within the page.
    pub offset: u64,
    /// True if the TLB supplied the translation.
    pub tlb_hit: bool,
    /// Entries probed by the walk, root first. Empty on a TLB hit.
    pub walk: Vec<WalkStep>,
    /// Home node of `frame`, when a NUMA model is configured.
    pub home_node: Option<usize>,
    /// Access latency of `frame`, when a NUMA model is configured.
    pub latency: Option<u64>,
}

/// Multi-level address translator with a TLB.
///
/// Owns its TLB, its page table and the policy that fabricates entries. Two
/// translators never share state.
pub struct AddressTranslator {
    config: TranslatorConfig,
    layout: AddressLayout,
    tlb: Tlb,
    table: PageTable,
    policy: Box<dyn PageTablePolicy>,
    numa: Option<NumaModel>,
    stats: TranslationStats,
}

impl AddressTranslator {
    /// Creates a translator whose page table is filled in by `policy`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the page geometry, TLB capacity or NUMA
    /// model is invalid.
    pub fn new<P>(config: &TranslatorConfig, policy: P) -> Result<Self, ConfigError>
    where
        P: PageTablePolicy + 'static,
    {
        let layout = AddressLayout::from_config(config)?;
        let numa = config.numa.map(NumaModel::new).transpose()?;

        debug!(
            page_size = config.page_size,
            levels = config.levels,
            bits_per_level = config.bits_per_level,
            va_bits = layout.va_bits(),
            tlb_entries = config.tlb_entries,
            numa = numa.is_some(),
            "translator constructed"
        );

        Ok(Self {
            config: *config,
            layout,
            tlb: Tlb::new(config.tlb_entries, config.tlb_policy),
            table: PageTable::new(),
            policy: Box::new(policy),
            numa,
            stats: TranslationStats::default(),
        })
    }

    /// Translates `vaddr` without a protection check.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationFault::AddressOutOfRange`] for an address wider
    /// than the layout, or [`TranslationFault::PageFault`] if the walk reaches
    /// an invalid entry.
    pub fn translate(&mut self, vaddr: VirtAddr) -> Result<Translation, TranslationFault> {
        self.translate_inner(vaddr, None)
    }

    /// Translates `vaddr` for an intended `access`.
    ///
    /// Behaves like [`translate`](Self::translate), then checks the page's
    /// protection bits. A write that succeeds marks the leaf entry dirty.
    ///
    /// # Errors
    ///
    /// As [`translate`](Self::translate), plus
    /// [`TranslationFault::ProtectionViolation`] when the page does not permit
    /// `access`.
    pub fn translate_for(
        &mut self,
        vaddr: VirtAddr,
        access: AccessType,
    ) -> Result<Translation, TranslationFault> {
        self.translate_inner(vaddr, Some(access))
    }

    fn translate_inner(
        &mut self,
        vaddr: VirtAddr,
        access: Option<AccessType>,
    ) -> Result<Translation, TranslationFault> {
        self.stats.translations += 1;

        if !self.layout.contains(vaddr) {
            self.stats.out_of_range += 1;
            debug!(%vaddr, width = self.layout.va_bits(), "address out of range");
            return Err(TranslationFault::AddressOutOfRange {
                vaddr,
                width: self.layout.va_bits(),
            });
        }

        let offset_bits = self.layout.offset_bits();
        let vpn = self.layout.vpn(vaddr);
        let offset = vaddr.page_offset(offset_bits);

        let (frame, protection, tlb_hit, walk) = if let Some(entry) = self.tlb.lookup(vpn) {
            self.stats.tlb_hits += 1;
            trace!(%vaddr, vpn, frame = entry.frame, "tlb hit");
            (entry.frame, entry.protection, true, Vec::new())
        } else {
            self.stats.tlb_misses += 1;
            trace!(%vaddr, vpn, "tlb miss");
            let walk = match page_table_walk(
                &self.layout,
                &mut self.table,
                self.policy.as_mut(),
                vaddr,
            ) {
                Ok(walk) => walk,
                Err(fault) => {
                    if let TranslationFault::PageFault { level, .. } = fault {
                        self.stats.levels_walked += level as u64 + 1;
                    }
                    self.stats.page_faults += 1;
                    debug!(%vaddr, %fault, "page fault");
                    return Err(fault);
                }
            };
            self.stats.levels_walked += walk.steps.len() as u64;
            for step in &walk.steps[..walk.steps.len().saturating_sub(1)] {
                let key = PteKey {
                    level: step.level,
                    path: self.layout.table_path(vpn, step.level),
                };
                self.table.touch(&key, false);
            }
            let _ = self.tlb.insert(vpn, walk.entry.frame, walk.entry.protection);
            (walk.entry.frame, walk.entry.protection, false, walk.steps)
        };

        if let Some(access) = access {
            if let Err(fault) = check_protection(vaddr, access, protection) {
                self.stats.protection_faults += 1;
                debug!(%vaddr, %access, %protection, "protection violation");
                return Err(fault);
            }
        }

        let leaf = PteKey {
            level: self.layout.levels() - 1,
            path: vpn,
        };
        self.table.touch(&leaf, access == Some(AccessType::Write));

        let paddr = PhysAddr::from_frame(frame, offset_bits, offset);
        let home_node = self.numa.map(|numa| numa.home_node(frame));
        let latency = self.numa.map(|numa| numa.latency(frame));
        trace!(%vaddr, %paddr, tlb_hit, "translated");

        Ok(Translation {
            vaddr,
            paddr,
            vpn,
            frame,
            offset,
            tlb_hit,
            walk,
            home_node,
            latency,
        })
    }

    /// Drops the cached translation for the page holding `vaddr`.
    ///
    /// Returns true if the TLB held one.
    pub fn invalidate_page(&mut self, vaddr: VirtAddr) -> bool {
        self.tlb.invalidate(self.layout.vpn(vaddr))
    }

    /// Invalidates every TLB entry. The page table is kept.
    pub fn flush_tlb(&mut self) {
        self.tlb.flush();
        debug!("tlb flushed");
    }

    /// Flushes the TLB, discards the page table, restores the policy and zeroes statistics.
    pub fn reset(&mut self) {
        self.tlb.flush();
        self.table.clear();
        self.policy.reset();
        self.stats = TranslationStats::default();
        debug!("translator reset");
    }

    /// The TLB.
    pub const fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    /// TLB slots, including invalid ones.
    pub fn tlb_entries(&self) -> &[TlbEntry] {
        self.tlb.entries()
    }

    /// The page table fabricated so far.
    pub const fn page_table(&self) -> &PageTable {
        &self.table
    }

    /// Address layout in effect.
    pub const fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    /// NUMA model, if configured.
    pub const fn numa(&self) -> Option<&NumaModel> {
        self.numa.as_ref()
    }

    /// The configuration this translator was built from.
    pub const fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Cumulative statistics since construction or the last reset.
    pub const fn stats(&self) -> &TranslationStats {
        &self.stats
    }
}

impl fmt::Debug for AddressTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressTranslator")
            .field("layout", &self.layout)
            .field("tlb", &self.tlb)
            .field("table_entries", &self.table.len())
            .field("numa", &self.numa)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Checks `access` against the page's protection bits.
///
/// # Errors
///
/// Returns [`TranslationFault::ProtectionViolation`] if the access is not permitted.
pub const fn check_protection(
    vaddr: VirtAddr,
    access: AccessType,
    protection: Protection,
) -> Result<(), TranslationFault> {
    if protection.permits(access) {
        Ok(())
    } else {
        Err(TranslationFault::ProtectionViolation { vaddr, access })
    }
}
