//! TLB Unit Tests.
//!
//! Verifies functionality of the Translation Lookaside Buffer:
//! - Basic lookup and insertion
//! - Protection bits carried with the entry
//! - Capacity and full associativity
//! - FIFO and LRU victim selection
//! - Invalidation and flushing

use memsim_core::common::Protection;
use memsim_core::config::TlbPolicy;
use memsim_core::mmu::tlb::Tlb;

// ══════════════════════════════════════════════════════════
// 1. Basic Operations
// ══════════════════════════════════════════════════════════

#[test]
fn lookup_miss_on_empty() {
    let mut tlb = Tlb::new(16, TlbPolicy::Fifo);
    assert_eq!(tlb.lookup(0x100), None);
    assert!(tlb.is_empty());
    assert_eq!(tlb.capacity(), 16);
}

#[test]
fn insert_and_lookup_hit() {
    let mut tlb = Tlb::new(16, TlbPolicy::Fifo);
    assert_eq!(tlb.insert(0xABC, 0x123, Protection::READ_EXECUTE), None);

    let entry = tlb.lookup(0xABC).expect("should hit after insert");
    assert_eq!(entry.frame, 0x123);
    assert_eq!(entry.protection, Protection::READ_EXECUTE);
    assert!(entry.valid);
    assert_eq!(tlb.len(), 1);
}

#[test]
fn reinsert_same_vpn_overwrites_in_place() {
    let mut tlb = Tlb::new(2, TlbPolicy::Fifo);
    let _ = tlb.insert(1, 10, Protection::READ_ONLY);
    assert_eq!(tlb.insert(1, 20, Protection::READ_WRITE), None);
    assert_eq!(tlb.len(), 1);
    assert_eq!(tlb.peek(1).unwrap().frame, 20);
}

#[test]
fn fully_associative_holds_any_vpns() {
    let mut tlb = Tlb::new(4, TlbPolicy::Fifo);
    // VPNs that would alias in a direct-mapped structure.
    for vpn in [0, 4, 8, 12] {
        assert_eq!(tlb.insert(vpn, vpn + 100, Protection::ALL), None);
    }
    for vpn in [0, 4, 8, 12] {
        assert_eq!(tlb.peek(vpn).unwrap().frame, vpn + 100);
    }
}

// ══════════════════════════════════════════════════════════
// 2. Replacement
// ══════════════════════════════════════════════════════════

#[test]
fn fifo_evicts_first_inserted_even_after_hits() {
    let mut tlb = Tlb::new(2, TlbPolicy::Fifo);
    let _ = tlb.insert(1, 10, Protection::ALL);
    let _ = tlb.insert(2, 20, Protection::ALL);
    let _ = tlb.lookup(1);

    let evicted = tlb.insert(3, 30, Protection::ALL).unwrap();
    assert_eq!(evicted.vpn, 1);
    assert!(tlb.peek(1).is_none());
    assert!(tlb.peek(2).is_some());
}

#[test]
fn lru_evicts_least_recently_used() {
    let mut tlb = Tlb::new(2, TlbPolicy::Lru);
    let _ = tlb.insert(1, 10, Protection::ALL);
    let _ = tlb.insert(2, 20, Protection::ALL);
    let _ = tlb.lookup(1);

    let evicted = tlb.insert(3, 30, Protection::ALL).unwrap();
    assert_eq!(evicted.vpn, 2);
    assert!(tlb.peek(1).is_some());
}

#[test]
fn peek_does_not_refresh_lru() {
    let mut tlb = Tlb::new(2, TlbPolicy::Lru);
    let _ = tlb.insert(1, 10, Protection::ALL);
    let _ = tlb.insert(2, 20, Protection::ALL);
    let _ = tlb.peek(1);

    assert_eq!(tlb.insert(3, 30, Protection::ALL).unwrap().vpn, 1);
}

#[test]
fn invalid_slot_filled_before_eviction() {
    let mut tlb = Tlb::new(3, TlbPolicy::Fifo);
    for vpn in 0..3 {
        let _ = tlb.insert(vpn, vpn, Protection::ALL);
    }
    assert!(tlb.invalidate(1));
    assert_eq!(tlb.insert(9, 9, Protection::ALL), None);
    assert_eq!(tlb.len(), 3);
}

// ══════════════════════════════════════════════════════════
// 3. Invalidation
// ══════════════════════════════════════════════════════════

#[test]
fn invalidate_missing_vpn_returns_false() {
    let mut tlb = Tlb::new(4, TlbPolicy::Fifo);
    assert!(!tlb.invalidate(7));
}

#[test]
fn flush_clears_everything() {
    let mut tlb = Tlb::new(4, TlbPolicy::Lru);
    for vpn in 0..4 {
        let _ = tlb.insert(vpn, vpn, Protection::ALL);
    }
    tlb.flush();
    assert!(tlb.is_empty());
    assert!(tlb.entries().iter().all(|entry| !entry.valid));
    assert_eq!(tlb.lookup(0), None);
}

#[test]
fn zero_capacity_is_widened_to_one() {
    let mut tlb = Tlb::new(0, TlbPolicy::Fifo);
    assert_eq!(tlb.capacity(), 1);
    let _ = tlb.insert(1, 1, Protection::ALL);
    assert_eq!(tlb.insert(2, 2, Protection::ALL).unwrap().vpn, 1);
}
