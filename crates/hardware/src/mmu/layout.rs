//! Virtual address layout and per-level decomposition.
//!
//! A virtual address splits into `levels` fixed-width page-table indices
//! (most-significant level first) followed by a page offset of
//! `log2(page_size)` bits:
//!
//! ```text
//!  | level 0 index | level 1 index | ... | level N-1 index | page offset |
//!  |<-- bits ----->|<-- bits ----->|     |<-- bits ------->|<- offset -->|
//! ```
//!
//! The concatenated indices form the virtual page number (VPN).

use crate::common::{ConfigError, TranslationFault, VirtAddr, low_mask};
use crate::config::TranslatorConfig;

/// Per-level indices and page offset of a virtual address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressBreakdown {
    /// Page-table index at each level, root level first.
    pub indices: Vec<u64>,
    /// Byte offset within the page.
    pub offset: u64,
}

/// Geometry of a multi-level virtual address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressLayout {
    page_size: u64,
    levels: usize,
    bits_per_level: u32,
    offset_bits: u32,
}

impl AddressLayout {
    /// Creates a layout for pages of `page_size` bytes and `levels` tables of
    /// `bits_per_level`-bit indices.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the page size is not a non-zero power of
    /// two, a count is zero, or the layout needs more than 64 address bits.
    pub fn new(
        page_size: u64,
        levels: usize,
        bits_per_level: u32,
    ) -> Result<Self, ConfigError> {
        let config = TranslatorConfig {
            page_size,
            levels,
            bits_per_level,
            ..TranslatorConfig::default()
        };
        Self::from_config(&config)
    }

    /// Builds the layout described by a translator configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            page_size: config.page_size,
            levels: config.levels,
            bits_per_level: config.bits_per_level,
            offset_bits: config.page_size.trailing_zeros(),
        })
    }

    /// Page size in bytes.
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of page-table levels.
    pub const fn levels(&self) -> usize {
        self.levels
    }

    /// Index width of each level.
    pub const fn bits_per_level(&self) -> u32 {
        self.bits_per_level
    }

    /// Width of the page offset field (`log2(page_size)`).
    pub const fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    /// Width of the virtual page number.
    pub const fn vpn_bits(&self) -> u32 {
        self.levels as u32 * self.bits_per_level
    }

    /// Number of virtual address bits covered by the layout.
    pub const fn va_bits(&self) -> u32 {
        self.offset_bits + self.vpn_bits()
    }

    /// Entries per page table (`2^bits_per_level`), saturating at `u64::MAX`.
    pub const fn entries_per_table(&self) -> u64 {
        match 1u64.checked_shl(self.bits_per_level) {
            Some(entries) => entries,
            None => u64::MAX,
        }
    }

    /// Returns true if no bits of `vaddr` lie above the covered width.
    pub const fn contains(&self, vaddr: VirtAddr) -> bool {
        match vaddr.val().checked_shr(self.va_bits()) {
            Some(high) => high == 0,
            None => true,
        }
    }

    /// Virtual page number of `vaddr`.
    pub const fn vpn(&self, vaddr: VirtAddr) -> u64 {
        vaddr.page_number(self.offset_bits)
    }

    /// VPN bits that lie below the index of `level` (0 for the leaf level).
    pub const fn span_bits(&self, level: usize) -> u32 {
        (self.levels - 1 - level) as u32 * self.bits_per_level
    }

    /// VPN prefix up to and including the index of `level`.
    ///
    /// The prefix identifies a page-table entry uniquely: everything above the
    /// level's own index names the table that holds it.
    pub const fn table_path(&self, vpn: u64, level: usize) -> u64 {
        match vpn.checked_shr(self.span_bits(level)) {
            Some(path) => path,
            None => 0,
        }
    }

    /// Index within its table of the entry at `level` on the path of `vpn`.
    pub const fn level_index(&self, vpn: u64, level: usize) -> u64 {
        self.table_path(vpn, level) & low_mask(self.bits_per_level)
    }

    /// Splits `vaddr` into per-level indices (root first) and a page offset.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationFault::AddressOutOfRange`] if `vaddr` has bits set
    /// above [`va_bits`](Self::va_bits).
    pub fn decompose(&self, vaddr: VirtAddr) -> Result<AddressBreakdown, TranslationFault> {
        if !self.contains(vaddr) {
            return Err(TranslationFault::AddressOutOfRange {
                vaddr,
                width: self.va_bits(),
            });
        }
        let vpn = self.vpn(vaddr);
        Ok(AddressBreakdown {
            indices: (0..self.levels)
                .map(|level| self.level_index(vpn, level))
                .collect(),
            offset: vaddr.page_offset(self.offset_bits),
        })
    }

    /// Reassembles a virtual address from its per-level indices and offset.
    ///
    /// Inverse of [`decompose`](Self::decompose); indices and offset are
    /// masked to their field widths.
    pub fn compose(&self, breakdown: &AddressBreakdown) -> VirtAddr {
        let index_mask = low_mask(self.bits_per_level);
        let vpn = breakdown
            .indices
            .iter()
            .fold(0u64, |acc, &index| {
                acc.checked_shl(self.bits_per_level).unwrap_or(0) | (index & index_mask)
            });
        let offset = breakdown.offset & low_mask(self.offset_bits);
        let base = vpn.checked_shl(self.offset_bits).unwrap_or(0);
        VirtAddr::new(base | offset)
    }
}

impl Default for AddressLayout {
    /// 4 KiB pages, four 9-bit levels.
    fn default() -> Self {
        let config = TranslatorConfig::default();
        Self {
            page_size: config.page_size,
            levels: config.levels,
            bits_per_level: config.bits_per_level,
            offset_bits: config.page_size.trailing_zeros(),
        }
    }
}
