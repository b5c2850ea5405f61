use memsim_core::mmu::page_table::{EntryProbe, EntrySpec, PageTablePolicy};
use mockall::mock;

mock! {
    pub Policy {}
    impl PageTablePolicy for Policy {
        fn fabricate(&mut self, probe: &EntryProbe) -> EntrySpec;
        fn reset(&mut self);
    }
}
