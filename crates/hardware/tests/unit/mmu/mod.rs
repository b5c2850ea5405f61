


/// Direct page table walks.
pub mod ptw;

/// TLB lookup, insertion and replacement.
pub mod tlb;

/// End-to-end translation.
pub mod translator;
