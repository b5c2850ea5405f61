//! Memory hierarchy simulation library.
//!
//! This crate models three independent pieces of a memory hierarchy:
//! 1. **Cache:** set-associative cache with LRU, FIFO or Random replacement.
//! 2. **Buddy:** power-of-two buddy allocator with splitting and coalescing.
//! 3. **MMU:** multi-level address translation behind a TLB, with optional NUMA latency.
//!
//! The simulators share configuration, error and statistics types but no
//! state. Every operation is synchronous and deterministic given its inputs
//! and seed.
//!
//! ```
//! use memsim_core::mmu::policies::DemandPaging;
//! use memsim_core::common::VirtAddr;
//! use memsim_core::{AddressTranslator, Config};
//!
//! let config = Config::default();
//! let mut mmu = AddressTranslator::new(&config.translator, DemandPaging::default()).unwrap();
//! let first = mmu.translate(VirtAddr::new(0x1234)).unwrap();
//! let again = mmu.translate(VirtAddr::new(0x1234)).unwrap();
//! assert!(!first.tlb_hit);
//! assert!(again.tlb_hit);
//! assert_eq!(first.paddr, again.paddr);
//! ```

/// Buddy allocator over a simulated power-of-two arena.
pub mod buddy;
/// Set-associative cache simulator and replacement policies.
pub mod cache;
/// Common types (addresses, access kinds, protection bits, errors).
pub mod common;
/// Simulator configuration (defaults, enums, per-simulator structures).
pub mod config;
/// Address translation (layout, TLB, page table, walker, NUMA model).
pub mod mmu;
/// Hit, allocation and translation counters.
pub mod stats;

/// Buddy allocator; construct with `BuddyAllocator::new`.
pub use crate::buddy::BuddyAllocator;
/// Cache simulator; construct with `CacheSim::new`.
pub use crate::cache::CacheSim;
/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Address translator; construct with `AddressTranslator::new` and a page-table policy.
pub use crate::mmu::AddressTranslator;
