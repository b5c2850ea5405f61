//! Address Translator Tests.
//!
//! Verifies the full translation path: TLB probe, page walk, fault
//! propagation, protection checks, accessed/dirty tracking, NUMA annotation,
//! and reset behaviour.

use memsim_core::AddressTranslator;
use memsim_core::common::{AccessType, PhysAddr, Protection, TranslationFault, VirtAddr};
use memsim_core::config::{FramePlacement, NumaConfig, TlbPolicy, TranslatorConfig};
use memsim_core::mmu::WalkStep;
use memsim_core::mmu::page_table::{EntrySpec, PteKey};
use memsim_core::mmu::policies::{DemandPaging, FixedMappings, RandomFixture};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::{demand_translator, init_tracing, translator_config};
use crate::common::mocks::MockPolicy;

// ══════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════

/// 256-byte pages, two levels of 4-bit indices: 16-bit virtual addresses.
fn small_config() -> TranslatorConfig {
    TranslatorConfig {
        page_size: 256,
        ..translator_config(2, 4, 4)
    }
}

fn fixed(config: &TranslatorConfig, mappings: FixedMappings) -> AddressTranslator {
    init_tracing();
    AddressTranslator::new(config, mappings).unwrap()
}

fn va(raw: u64) -> VirtAddr {
    VirtAddr::new(raw)
}

// ══════════════════════════════════════════════════════════
// 1. Determinism and the TLB
// ══════════════════════════════════════════════════════════

#[test]
fn second_translation_hits_the_tlb() {
    let mut mmu = demand_translator(&TranslatorConfig::default());
    let first = mmu.translate(va(0x1234)).unwrap();
    let second = mmu.translate(va(0x1234)).unwrap();

    assert!(!first.tlb_hit);
    assert!(second.tlb_hit);
    assert_eq!(first.paddr, second.paddr);
    assert_eq!(first.frame, second.frame);
    assert_eq!(first.walk.len(), 4);
    assert!(second.walk.is_empty());

    let stats = mmu.stats();
    assert_eq!(stats.translations, 2);
    assert_eq!(stats.tlb_hits, 1);
    assert_eq!(stats.tlb_misses, 1);
    assert_eq!(stats.levels_walked, 4);
}

#[test]
fn same_page_different_offset_hits() {
    let mut mmu = demand_translator(&TranslatorConfig::default());
    let a = mmu.translate(va(0x5000)).unwrap();
    let b = mmu.translate(va(0x5FFF)).unwrap();
    assert!(b.tlb_hit);
    assert_eq!(a.frame, b.frame);
    assert_eq!(b.offset, 0xFFF);
    assert_eq!(b.paddr.val() - a.paddr.val(), 0xFFF);
}

#[test]
fn physical_address_combines_frame_and_offset() {
    let mut mmu = fixed(
        &TranslatorConfig::default(),
        FixedMappings::new().map(0x1, 0x42, Protection::READ_WRITE),
    );
    let t = mmu.translate(va(0x1234)).unwrap();
    assert_eq!(t.vpn, 0x1);
    assert_eq!(t.frame, 0x42);
    assert_eq!(t.offset, 0x234);
    assert_eq!(t.paddr, PhysAddr::new(0x42234));
}

#[test]
fn walk_lists_each_level() {
    let mut mmu = demand_translator(&small_config());
    let t = mmu.translate(va(0xA7_33)).unwrap();
    assert_eq!(
        t.walk,
        vec![
            WalkStep {
                level: 0,
                index: 0xA,
                frame: 0,
            },
            WalkStep {
                level: 1,
                index: 0x7,
                frame: 1,
            },
        ]
    );
    assert_eq!(t.frame, 1);
}

#[test]
fn tlb_capacity_evicts_by_policy() {
    let config = TranslatorConfig {
        tlb_policy: TlbPolicy::Fifo,
        ..translator_config(4, 9, 2)
    };
    let mut mmu = demand_translator(&config);
    for page in 0..3u64 {
        assert!(!mmu.translate(va(page << 12)).unwrap().tlb_hit);
    }
    assert_eq!(mmu.tlb().len(), 2);
    assert!(!mmu.translate(va(0)).unwrap().tlb_hit, "page 0 was evicted first");
    assert!(mmu.translate(va(2 << 12)).unwrap().tlb_hit);
}

#[test]
fn flush_keeps_the_page_table() {
    let mut mmu = demand_translator(&TranslatorConfig::default());
    let before = mmu.translate(va(0x9000)).unwrap();
    let entries = mmu.page_table().len();

    mmu.flush_tlb();
    assert!(mmu.tlb().is_empty());

    let after = mmu.translate(va(0x9000)).unwrap();
    assert!(!after.tlb_hit);
    assert_eq!(after.paddr, before.paddr);
    assert_eq!(mmu.page_table().len(), entries, "walk reused existing entries");
}

#[test]
fn invalidate_page_forces_a_walk() {
    let mut mmu = demand_translator(&TranslatorConfig::default());
    let _ = mmu.translate(va(0x3000)).unwrap();
    assert!(mmu.invalidate_page(va(0x3ABC)));
    assert!(!mmu.invalidate_page(va(0x3ABC)));
    assert!(!mmu.translate(va(0x3000)).unwrap().tlb_hit);
}

// ══════════════════════════════════════════════════════════
// 2. Faults
// ══════════════════════════════════════════════════════════

#[test]
fn page_fault_at_root_inserts_nothing() {
    let mut mmu = fixed(&TranslatorConfig::default(), FixedMappings::new());
    let vaddr = va(0x4000);

    assert_eq!(
        mmu.translate(vaddr),
        Err(TranslationFault::PageFault { vaddr, level: 0 })
    );
    assert!(mmu.tlb().is_empty());
    assert_eq!(
        mmu.translate(vaddr),
        Err(TranslationFault::PageFault { vaddr, level: 0 }),
        "faults are not cached as hits"
    );

    let stats = mmu.stats();
    assert_eq!(stats.page_faults, 2);
    assert_eq!(stats.tlb_hits, 0);
    assert_eq!(stats.levels_walked, 2);
}

#[test]
fn page_fault_reports_the_invalid_level() {
    let mut mmu = fixed(
        &small_config(),
        FixedMappings::new().map(0x12, 5, Protection::READ_WRITE),
    );
    assert!(mmu.translate(va(0x12_00)).is_ok());

    let vaddr = va(0x13_00);
    assert_eq!(
        mmu.translate(vaddr),
        Err(TranslationFault::PageFault { vaddr, level: 1 })
    );
    assert_eq!(mmu.tlb().len(), 1, "only the successful translation is cached");
}

#[test]
fn out_of_range_address_is_rejected() {
    let mut mmu = demand_translator(&TranslatorConfig::default());
    let vaddr = va(1 << 48);
    assert_eq!(
        mmu.translate(vaddr),
        Err(TranslationFault::AddressOutOfRange { vaddr, width: 48 })
    );
    assert_eq!(mmu.stats().out_of_range, 1);
    assert!(mmu.page_table().is_empty());
}

#[test]
fn walk_stops_at_first_invalid_entry() {
    let mut mmu = fixed(&TranslatorConfig::default(), FixedMappings::new());
    let _ = mmu.translate(va(0x1000));
    assert_eq!(mmu.page_table().len(), 1, "nothing below the invalid root entry");
}

#[test]
fn mapping_wider_than_the_layout_never_aliases() {
    // small_config has an 8-bit VPN; 0x1AB shares its low byte with 0xAB.
    let mut mmu = fixed(
        &small_config(),
        FixedMappings::new().map(0x1AB, 3, Protection::ALL),
    );
    let vaddr = va(0xAB_00);
    assert_eq!(
        mmu.translate(vaddr),
        Err(TranslationFault::PageFault { vaddr, level: 0 })
    );
    let wide = va(0x1AB_00);
    assert_eq!(
        mmu.translate(wide),
        Err(TranslationFault::AddressOutOfRange { vaddr: wide, width: 16 })
    );
}

// ══════════════════════════════════════════════════════════
// 3. Protection
// ══════════════════════════════════════════════════════════

#[test]
fn write_to_read_only_page_is_a_protection_violation() {
    let mut mmu = fixed(
        &small_config(),
        FixedMappings::new().map(0x01, 3, Protection::READ_ONLY),
    );
    let vaddr = va(0x0110);

    assert_eq!(
        mmu.translate_for(vaddr, AccessType::Write),
        Err(TranslationFault::ProtectionViolation {
            vaddr,
            access: AccessType::Write,
        })
    );
    assert_eq!(mmu.stats().protection_faults, 1);
    assert_eq!(mmu.stats().page_faults, 0);

    // The mapping is valid, so the TLB now holds it and a read succeeds from there.
    let read = mmu.translate_for(vaddr, AccessType::Read).unwrap();
    assert!(read.tlb_hit);
}

#[test]
fn protection_checked_on_tlb_hit() {
    let mut mmu = fixed(
        &small_config(),
        FixedMappings::new().map(0x01, 3, Protection::READ_WRITE),
    );
    assert!(mmu.translate_for(va(0x0100), AccessType::Read).is_ok());
    assert!(matches!(
        mmu.translate_for(va(0x0100), AccessType::Execute),
        Err(TranslationFault::ProtectionViolation {
            access: AccessType::Execute,
            ..
        })
    ));
    assert_eq!(mmu.stats().tlb_hits, 1);
}

#[test]
fn plain_translate_skips_protection() {
    let mut mmu = fixed(
        &small_config(),
        FixedMappings::new().map(0x01, 3, Protection::NONE),
    );
    assert!(mmu.translate(va(0x0100)).is_ok());
}

#[test]
fn accessed_and_dirty_flags_track_use() {
    let mut mmu = fixed(
        &small_config(),
        FixedMappings::new()
            .map(0x01, 3, Protection::READ_WRITE)
            .map(0x02, 4, Protection::READ_WRITE),
    );
    let leaf = |path| PteKey { level: 1, path };

    let _ = mmu.translate_for(va(0x0100), AccessType::Read).unwrap();
    let entry = *mmu.page_table().get(&leaf(0x01)).unwrap();
    assert!(entry.accessed);
    assert!(!entry.dirty);

    // Dirty is set even when the translation comes from the TLB.
    let _ = mmu.translate_for(va(0x0104), AccessType::Write).unwrap();
    assert!(mmu.page_table().get(&leaf(0x01)).unwrap().dirty);

    assert!(mmu.page_table().get(&leaf(0x02)).is_none(), "never probed");
    let root = mmu.page_table().get(&PteKey { level: 0, path: 0 }).unwrap();
    assert!(root.accessed);
}

// ══════════════════════════════════════════════════════════
// 4. NUMA
// ══════════════════════════════════════════════════════════

#[test]
fn numa_latency_follows_home_node() {
    let config = small_config().with_numa(NumaConfig::default());
    let mut mmu = demand_translator(&config);

    // Root table gets frame 0, first leaf frame 1 (node 1, remote).
    let remote = mmu.translate(va(0x0000)).unwrap();
    assert_eq!(remote.frame, 1);
    assert_eq!(remote.home_node, Some(1));
    assert_eq!(remote.latency, Some(150));

    // Next page under the same root entry gets frame 2 (node 0, local).
    let local = mmu.translate(va(0x0100)).unwrap();
    assert_eq!(local.frame, 2);
    assert_eq!(local.home_node, Some(0));
    assert_eq!(local.latency, Some(100));
}

#[test]
fn numa_blocked_placement() {
    let numa = NumaConfig {
        nodes: 4,
        requesting_node: 2,
        local_latency: 10,
        remote_latency: 40,
        placement: FramePlacement::Blocked { frames_per_node: 2 },
    };
    let mut mmu = AddressTranslator::new(
        &small_config().with_numa(numa),
        DemandPaging::new(4),
    )
    .unwrap();
    let t = mmu.translate(va(0)).unwrap();
    assert_eq!(t.frame, 5);
    assert_eq!(t.home_node, Some(2));
    assert_eq!(t.latency, Some(10));
}

#[test]
fn no_numa_model_means_no_annotation() {
    let mut mmu = demand_translator(&small_config());
    let t = mmu.translate(va(0)).unwrap();
    assert_eq!(t.home_node, None);
    assert_eq!(t.latency, None);
    assert!(mmu.numa().is_none());
}

#[test]
fn invalid_numa_config_rejected_at_construction() {
    let config = small_config().with_numa(NumaConfig {
        nodes: 0,
        ..NumaConfig::default()
    });
    assert!(AddressTranslator::new(&config, DemandPaging::default()).is_err());
}

// ══════════════════════════════════════════════════════════
// 5. Lazy Fabrication
// ══════════════════════════════════════════════════════════

#[test]
fn each_entry_fabricated_exactly_once() {
    init_tracing();
    let mut policy = MockPolicy::new();
    let _ = policy
        .expect_fabricate()
        .times(4)
        .returning(|probe| EntrySpec::mapped(probe.level as u64 + 10, Protection::ALL));

    let mut mmu = AddressTranslator::new(&TranslatorConfig::default(), policy).unwrap();
    for _ in 0..3 {
        assert_eq!(mmu.translate(va(0xDEAD_B000)).unwrap().frame, 13);
    }
    mmu.flush_tlb();
    assert_eq!(mmu.translate(va(0xDEAD_B000)).unwrap().frame, 13);
}

#[test]
fn reset_restores_policy_and_clears_state() {
    init_tracing();
    let mut policy = MockPolicy::new();
    let _ = policy
        .expect_fabricate()
        .times(4)
        .returning(|_| EntrySpec::mapped(1, Protection::ALL));
    let _ = policy.expect_reset().times(1).return_const(());

    let mut mmu = AddressTranslator::new(&small_config(), policy).unwrap();
    let _ = mmu.translate(va(0x0100)).unwrap();
    mmu.reset();
    assert!(mmu.page_table().is_empty());
    assert!(mmu.tlb().is_empty());
    assert_eq!(mmu.stats().translations, 0);

    // Fabricated again after the reset.
    assert!(!mmu.translate(va(0x0100)).unwrap().tlb_hit);
}

#[test]
fn demand_paging_reset_reproduces_frames() {
    let mut mmu = demand_translator(&TranslatorConfig::default());
    let addrs = [0x1000, 0x7_0000_0000, 0x2000];
    let first: Vec<u64> = addrs.iter().map(|&a| mmu.translate(va(a)).unwrap().frame).collect();
    mmu.reset();
    let second: Vec<u64> = addrs.iter().map(|&a| mmu.translate(va(a)).unwrap().frame).collect();
    assert_eq!(first, second);
}

#[test]
fn random_fixture_translators_agree() {
    let run = || {
        let mut mmu =
            AddressTranslator::new(&small_config(), RandomFixture::new(2024, 0.25, 64)).unwrap();
        (0..64u64)
            .map(|page| mmu.translate(va(page << 8)).map(|t| t.paddr))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

// ══════════════════════════════════════════════════════════
// 6. Properties
// ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn demand_translation_is_deterministic(raw in 0u64..1 << 48) {
        let mut mmu = demand_translator(&TranslatorConfig::default());
        let first = mmu.translate(va(raw)).unwrap();
        let second = mmu.translate(va(raw)).unwrap();

        prop_assert!(!first.tlb_hit);
        prop_assert!(second.tlb_hit);
        prop_assert_eq!(first.paddr, second.paddr);
        prop_assert_eq!(first.paddr.val() & 0xFFF, raw & 0xFFF);
        prop_assert_eq!(first.vpn, raw >> 12);
    }

    #[test]
    fn faults_never_populate_the_tlb(pages in prop::collection::vec(0u64..256, 1..40)) {
        let mut mmu = fixed(
            &small_config(),
            FixedMappings::new().map(0x10, 1, Protection::ALL).map(0x20, 2, Protection::ALL),
        );
        for page in pages {
            let mapped = page == 0x10 || page == 0x20;
            let result = mmu.translate(va(page << 8));
            prop_assert_eq!(result.is_ok(), mapped);
            let mut cached = mmu.tlb().entries().iter().filter(|e| e.valid);
            prop_assert!(cached.all(|e| e.vpn == 0x10 || e.vpn == 0x20));
        }
    }
}
