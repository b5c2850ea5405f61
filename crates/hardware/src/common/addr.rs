//! Physical and Virtual Address types.
//!
//! This module defines strong types for physical and virtual addresses to prevent
//! accidental mixing of address spaces. It provides the following:
//! 1. **Type Safety:** Distinguishes between virtual and physical address spaces at compile time.
//! 2. **Address Manipulation:** Helpers for extracting page offsets and page numbers.
//! 3. **Translation Integration:** The input and output types of the address translator.

use std::fmt;

use super::constants::low_mask;

/// A virtual address as issued by a simulated program.
///
/// Virtual addresses must be translated to physical addresses through the
/// [`AddressTranslator`](crate::mmu::AddressTranslator) before they name a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u64);

/// A physical address produced by a successful translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Extracts the byte offset within a page of `1 << offset_bits` bytes.
    #[inline]
    pub const fn page_offset(&self, offset_bits: u32) -> u64 {
        self.0 & low_mask(offset_bits)
    }

    /// Extracts the virtual page number for pages of `1 << offset_bits` bytes.
    #[inline]
    pub const fn page_number(&self, offset_bits: u32) -> u64 {
        match self.0.checked_shr(offset_bits) {
            Some(vpn) => vpn,
            None => 0,
        }
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Builds a physical address from a frame number and a page offset.
    #[inline]
    pub const fn from_frame(frame: u64, offset_bits: u32, offset: u64) -> Self {
        let base = match frame.checked_shl(offset_bits) {
            Some(base) => base,
            None => 0,
        };
        Self(base | (offset & low_mask(offset_bits)))
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for VirtAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl From<u64> for PhysAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}
