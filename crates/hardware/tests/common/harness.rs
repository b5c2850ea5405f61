use memsim_core::config::{CacheConfig, ReplacementPolicy, TranslatorConfig};
use memsim_core::mmu::policies::DemandPaging;
use memsim_core::{AddressTranslator, BuddyAllocator, CacheSim};
use tracing_subscriber::EnvFilter;

/// Routes simulator events to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn cache(size: u64, block: u64, ways: usize, policy: ReplacementPolicy) -> CacheSim {
    init_tracing();
    CacheSim::new(&CacheConfig::new(size, block, ways, policy)).unwrap()
}

/// A single-set cache: every address with the same block offset competes for the same ways.
pub fn single_set(ways: usize, policy: ReplacementPolicy) -> CacheSim {
    cache(64 * ways as u64, 64, ways, policy)
}

pub fn buddy(total: u64) -> BuddyAllocator {
    init_tracing();
    BuddyAllocator::with_size(total).unwrap()
}

pub fn translator_config(
    levels: usize,
    bits_per_level: u32,
    tlb_entries: usize,
) -> TranslatorConfig {
    TranslatorConfig {
        levels,
        bits_per_level,
        tlb_entries,
        ..TranslatorConfig::default()
    }
}

/// A demand-paged translator: every address translates, frames count up from 0.
pub fn demand_translator(config: &TranslatorConfig) -> AddressTranslator {
    init_tracing();
    AddressTranslator::new(config, DemandPaging::default()).unwrap()
}
