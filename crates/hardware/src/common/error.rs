//! Error definitions for configuration and simulator operations.
//!
//! This module defines the typed failures reported by the engine. It provides:
//! 1. **Configuration Errors:** Raised once, at construction, for inconsistent geometry.
//! 2. **Allocation Errors:** Outcomes of buddy allocation and free requests.
//! 3. **Translation Faults:** Outcomes of a virtual-to-physical translation.
//!
//! Operational errors never corrupt simulator state; the simulator stays usable
//! after any of them.

use thiserror::Error;

use super::addr::VirtAddr;
use super::data::AccessType;
use crate::buddy::BlockId;

/// A configuration record that cannot describe a valid simulator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A size or count that must be positive was zero.
    #[error("`{field}` must be greater than zero")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A size that must be a power of two was not.
    #[error("`{field}` must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending field (or derived quantity).
        field: &'static str,
        /// The rejected value.
        value: u64,
    },

    /// The cache size is not a whole number of sets.
    #[error("cache size {size} is not a multiple of block size {block} x {ways} ways")]
    Indivisible {
        /// Total cache size in bytes.
        size: u64,
        /// Block size in bytes.
        block: u64,
        /// Associativity.
        ways: u64,
    },

    /// A value lies outside its permitted range.
    #[error("`{field}` = {value} exceeds the maximum of {max}")]
    OutOfRange {
        /// Name of the offending field (or derived quantity).
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Largest accepted value.
        max: u64,
    },

    /// A JSON configuration document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

/// A failed [`BuddyAllocator::allocate`](crate::buddy::BuddyAllocator::allocate) request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// No free block, even after splitting, can hold the rounded request.
    #[error("out of memory: {requested} bytes requested ({rounded} after rounding)")]
    OutOfMemory {
        /// Size the caller asked for.
        requested: u64,
        /// Power-of-two block size the request rounded up to.
        rounded: u64,
    },

    /// Zero-byte requests are rejected.
    #[error("allocation size must be greater than zero")]
    ZeroSize,
}

/// A failed [`BuddyAllocator::free`](crate::buddy::BuddyAllocator::free) request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FreeError {
    /// The id was never issued by this allocator.
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    /// The block is not currently allocated: it was already freed, absorbed by
    /// a merge, or split into smaller blocks.
    #[error("block {0} is not an allocated block")]
    DoubleFree(BlockId),
}

/// A failed virtual-to-physical translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TranslationFault {
    /// An entry on the walk path was invalid.
    #[error("page fault at {vaddr} (level {level})")]
    PageFault {
        /// The faulting virtual address.
        vaddr: VirtAddr,
        /// Page-table level whose entry was invalid (0 = root).
        level: usize,
    },

    /// The mapping exists but does not permit the requested access.
    #[error("protection violation: {access} access to {vaddr}")]
    ProtectionViolation {
        /// The faulting virtual address.
        vaddr: VirtAddr,
        /// The access that was refused.
        access: AccessType,
    },

    /// The address has bits set above the translated width.
    #[error("address {vaddr} does not fit in {width} virtual address bits")]
    AddressOutOfRange {
        /// The rejected virtual address.
        vaddr: VirtAddr,
        /// Number of virtual address bits covered by the layout.
        width: u32,
    },
}
