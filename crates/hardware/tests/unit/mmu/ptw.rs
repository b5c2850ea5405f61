//! Page Table Walker Tests.
//!
//! Calls the walker directly on a two-level layout and checks the probed
//! steps, the returned leaf entry and the faulting level.

use memsim_core::common::{Protection, TranslationFault, VirtAddr};
use memsim_core::mmu::WalkStep;
use memsim_core::mmu::layout::AddressLayout;
use memsim_core::mmu::page_table::{PageTable, PteKey};
use memsim_core::mmu::policies::{DemandPaging, FixedMappings};
use memsim_core::mmu::ptw::page_table_walk;
use pretty_assertions::assert_eq;

/// 256-byte pages, two levels of 4-bit indices.
fn layout() -> AddressLayout {
    AddressLayout::new(256, 2, 4).unwrap()
}

#[test]
fn walk_returns_the_stored_leaf_entry() {
    let layout = layout();
    let mut table = PageTable::new();
    let mut policy = DemandPaging::new(40).with_protection(Protection::READ_ONLY);

    let walk = page_table_walk(&layout, &mut table, &mut policy, VirtAddr::new(0x3A7F)).unwrap();

    assert_eq!(
        walk.steps,
        vec![
            WalkStep {
                level: 0,
                index: 0x3,
                frame: 40,
            },
            WalkStep {
                level: 1,
                index: 0xA,
                frame: 41,
            },
        ]
    );
    let stored = table.get(&PteKey { level: 1, path: 0x3A }).unwrap();
    assert_eq!(&walk.entry, stored);
    assert_eq!(walk.entry.protection, Protection::READ_ONLY);
}

#[test]
fn walk_stops_at_first_invalid_level() {
    let layout = layout();
    let mut table = PageTable::new();
    let mut policy = FixedMappings::new().map(0x3A, 9, Protection::READ_WRITE);

    let vaddr = VirtAddr::new(0x3B00);
    assert_eq!(
        page_table_walk(&layout, &mut table, &mut policy, vaddr),
        Err(TranslationFault::PageFault { vaddr, level: 1 })
    );

    let vaddr = VirtAddr::new(0x4000);
    assert_eq!(
        page_table_walk(&layout, &mut table, &mut policy, vaddr),
        Err(TranslationFault::PageFault { vaddr, level: 0 })
    );
}
