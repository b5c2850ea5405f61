//! Common utilities and types shared by every simulator in the engine.
//!
//! This module provides the building blocks used across the cache, allocator
//! and translation simulators. It includes:
//! 1. **Address Types:** Strong types for virtual and physical addresses.
//! 2. **Constants:** Bit-width limits and helpers for address decomposition.
//! 3. **Memory Access:** Access kinds and read/write/execute protection sets.
//! 4. **Error Handling:** Configuration errors and per-operation failures.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Common constants and bit helpers.
pub mod constants;

/// Memory access type and protection definitions.
pub mod data;

/// Error types for configuration and simulator operations.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use constants::{ADDRESS_WIDTH, low_mask};
pub use data::{AccessType, Protection};
pub use error::{AllocationError, ConfigError, FreeError, TranslationFault};
