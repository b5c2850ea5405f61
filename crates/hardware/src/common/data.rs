//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the engine.
//! These types are used for the following:
//! 1. **Permission Validation:** Checking Read/Write/Execute (RWX) permissions during translation.
//! 2. **Dirty Tracking:** Marking cache lines and page-table entries dirty on writes.
//! 3. **Fault Reporting:** Naming the access that caused a protection violation.

use std::fmt;

/// Type of memory access operation.
///
/// Used to distinguish loads, stores and instruction fetches for
/// protection checks and dirty-bit maintenance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Data read access. Requires Read (R) permission.
    #[default]
    Read,

    /// Data write access. Requires Write (W) permission and marks lines and entries dirty.
    Write,

    /// Instruction fetch. Requires Execute (X) permission.
    Execute,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// Read/write/execute permission set carried by page-table and TLB entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Protection {
    /// Read permission.
    pub read: bool,
    /// Write permission.
    pub write: bool,
    /// Execute permission.
    pub execute: bool,
}

impl Protection {
    /// No access permitted.
    pub const NONE: Self = Self::new(false, false, false);
    /// Read-only data.
    pub const READ_ONLY: Self = Self::new(true, false, false);
    /// Read/write data.
    pub const READ_WRITE: Self = Self::new(true, true, false);
    /// Read/execute code.
    pub const READ_EXECUTE: Self = Self::new(true, false, true);
    /// Every permission.
    pub const ALL: Self = Self::new(true, true, true);

    /// Creates a protection set from individual permission bits.
    pub const fn new(read: bool, write: bool, execute: bool) -> Self {
        Self {
            read,
            write,
            execute,
        }
    }

    /// Returns true if this set allows the given access.
    pub const fn permits(&self, access: AccessType) -> bool {
        match access {
            AccessType::Read => self.read,
            AccessType::Write => self.write,
            AccessType::Execute => self.execute,
        }
    }
}

impl fmt::Display for Protection {
    /// Formats as the familiar `rwx` triple, with `-` for a missing permission.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            bit(self.read, 'r'),
            bit(self.write, 'w'),
            bit(self.execute, 'x')
        )
    }
}
