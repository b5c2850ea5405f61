//! Set-Associative Cache Simulator.
//!
//! This module implements a configurable set-associative cache simulator with
//! LRU, FIFO and Random replacement. Each access decomposes the address into
//! tag, set index and block offset, searches the addressed set, and on a miss
//! fills an empty way or evicts a victim chosen by the policy.
//!
//! Only hit/miss bookkeeping is modelled; no data is stored and no timing is
//! simulated.

/// Cache replacement policy implementations (FIFO, LRU, Random).
pub mod policies;

use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, trace};

use self::policies::{FifoPolicy, LruPolicy, RandomPolicy, ReplacementPolicy};
use crate::common::{AccessType, ConfigError, low_mask};
use crate::config::{CacheConfig, ReplacementPolicy as PolicyType};
use crate::stats::CacheStats;

/// Cache line entry containing tag, validity, dirty bit and age stamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    valid: bool,
    tag: u64,
    dirty: bool,
    last_touched: u64,
}

impl CacheLine {
    /// Creates a valid, clean line holding `tag`, stamped with `last_touched`.
    pub const fn new(tag: u64, last_touched: u64) -> Self {
        Self {
            valid: true,
            tag,
            dirty: false,
            last_touched,
        }
    }

    /// Returns true if the line holds a block.
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tag of the resident block (meaningless while invalid).
    pub const fn tag(&self) -> u64 {
        self.tag
    }

    /// Returns true if the block was written since it was filled.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sequence number of the fill (FIFO, Random) or of the latest access (LRU).
    pub const fn last_touched(&self) -> u64 {
        self.last_touched
    }
}

/// One set of the cache: `ways` lines indexed by way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheSet {
    lines: Vec<CacheLine>,
}

impl CacheSet {
    fn new(ways: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); ways],
        }
    }

    /// All lines of the set, indexed by way.
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    /// The line in `way`, if the way exists.
    pub fn line(&self, way: usize) -> Option<&CacheLine> {
        self.lines.get(way)
    }

    /// Number of valid lines in the set.
    pub fn valid_count(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }

    fn find(&self, tag: u64) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    fn first_invalid(&self) -> Option<usize> {
        self.lines.iter().position(|line| !line.valid)
    }

    fn invalidate(&mut self) {
        self.lines.fill(CacheLine::default());
    }
}

/// Tag / set index / block offset fields of an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheAddress {
    /// High-order bits compared against line tags.
    pub tag: u64,
    /// Set the address maps to.
    pub index: usize,
    /// Byte offset within the block.
    pub offset: u64,
}

/// Outcome of a single cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessResult {
    /// True if a valid line with a matching tag was found.
    pub hit: bool,
    /// Set the address mapped to.
    pub set_index: usize,
    /// Way that hit, or way that was filled on a miss.
    pub way_index: usize,
    /// Tag of the accessed address.
    pub tag: u64,
    /// Tag of the line evicted to make room, if a valid line was replaced.
    pub evicted: Option<u64>,
    /// True if the evicted line was dirty (a write-back).
    pub evicted_dirty: bool,
}

/// Cache simulator implementing a set-associative cache with a configurable policy.
///
/// Construct it from a [`CacheConfig`], call [`access`](Self::access) once per
/// simulated reference, and read [`stats`](Self::stats) or the set snapshot
/// after each call.
pub struct CacheSim {
    config: CacheConfig,
    sets: Vec<CacheSet>,
    offset_bits: u32,
    index_bits: u32,
    sequence: u64,
    policy: Box<dyn ReplacementPolicy>,
    stats: CacheStats,
}

impl CacheSim {
    /// Creates a new cache simulator with the specified configuration.
    ///
    /// The Random policy draws from a `StdRng` seeded with `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the size, block size and associativity are
    /// not mutually consistent (see [`CacheConfig::num_sets`]).
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(config.seed))
    }

    /// Creates a new cache simulator whose Random policy draws from `rng`.
    ///
    /// The source is cloned at construction so [`reset`](Self::reset) replays
    /// the same victim sequence. Other policies ignore it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for inconsistent geometry.
    pub fn with_rng<R>(config: &CacheConfig, rng: R) -> Result<Self, ConfigError>
    where
        R: RngCore + Clone + Send + Sync + 'static,
    {
        let num_sets = config.num_sets()?;

        let policy: Box<dyn ReplacementPolicy> = match config.policy {
            PolicyType::Lru => Box::new(LruPolicy::new()),
            PolicyType::Fifo => Box::new(FifoPolicy::new()),
            PolicyType::Random => Box::new(RandomPolicy::new(rng)),
        };

        debug!(
            size = config.size_bytes,
            block = config.block_bytes,
            ways = config.ways,
            sets = num_sets,
            policy = policy.name(),
            "cache constructed"
        );

        Ok(Self {
            config: *config,
            sets: vec![CacheSet::new(config.ways); num_sets],
            offset_bits: config.block_bytes.trailing_zeros(),
            index_bits: num_sets.trailing_zeros(),
            sequence: 0,
            policy,
            stats: CacheStats::default(),
        })
    }

    /// Splits an address into tag, set index and block offset.
    pub fn decompose(&self, addr: u64) -> CacheAddress {
        let offset = addr & low_mask(self.offset_bits);
        let block = addr.checked_shr(self.offset_bits).unwrap_or(0);
        let index = (block & low_mask(self.index_bits)) as usize;
        let tag = block.checked_shr(self.index_bits).unwrap_or(0);
        CacheAddress { tag, index, offset }
    }

    /// Checks if the cache holds the block containing `addr`.
    ///
    /// Pure probe: no statistics or replacement state change.
    pub fn contains(&self, addr: u64) -> bool {
        let CacheAddress { tag, index, .. } = self.decompose(addr);
        self.sets[index].find(tag).is_some()
    }

    /// Performs a read access. Equivalent to `access_with(addr, AccessType::Read)`.
    pub fn access(&mut self, addr: u64) -> AccessResult {
        self.access_with(addr, AccessType::Read)
    }

    /// Accesses the cache for the specified address.
    ///
    /// On a hit the policy may refresh the line's stamp; on a miss the first
    /// invalid way is filled, or the policy chooses a victim when the set is
    /// full. Writes mark the line dirty. Only the addressed set is touched.
    pub fn access_with(&mut self, addr: u64, kind: AccessType) -> AccessResult {
        let CacheAddress { tag, index, .. } = self.decompose(addr);
        self.sequence += 1;
        let stamp = self.sequence;
        let is_write = kind == AccessType::Write;

        let set = &mut self.sets[index];

        if let Some(way) = set.find(tag) {
            let line = &mut set.lines[way];
            if self.policy.refresh_on_hit() {
                line.last_touched = stamp;
            }
            if is_write {
                line.dirty = true;
            }
            self.stats.hits += 1;
            trace!(addr, set = index, way, tag, "cache hit");
            return AccessResult {
                hit: true,
                set_index: index,
                way_index: way,
                tag,
                evicted: None,
                evicted_dirty: false,
            };
        }

        let way = match set.first_invalid() {
            Some(way) => way,
            None => self.policy.get_victim(&set.lines).min(set.lines.len() - 1),
        };

        let victim = set.lines[way];
        let evicted = victim.valid.then_some(victim.tag);
        let evicted_dirty = victim.valid && victim.dirty;
        if let Some(old_tag) = evicted {
            self.stats.evictions += 1;
            if evicted_dirty {
                self.stats.writebacks += 1;
            }
            debug!(
                set = index,
                way,
                old_tag,
                new_tag = tag,
                dirty = evicted_dirty,
                policy = self.policy.name(),
                "cache eviction"
            );
        }

        set.lines[way] = CacheLine {
            valid: true,
            tag,
            dirty: is_write,
            last_touched: stamp,
        };
        self.stats.misses += 1;
        trace!(addr, set = index, way, tag, "cache miss");

        AccessResult {
            hit: false,
            set_index: index,
            way_index: way,
            tag,
            evicted,
            evicted_dirty,
        }
    }

    /// Invalidates every line, zeroes statistics and restores the policy.
    pub fn reset(&mut self) {
        for set in &mut self.sets {
            set.invalidate();
        }
        self.sequence = 0;
        self.stats = CacheStats::default();
        self.policy.reset();
        debug!("cache reset");
    }

    /// Cumulative hit/miss statistics since construction or the last reset.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The configuration this cache was built from.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// All sets, indexed by set number.
    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// The set at `index`, if it exists.
    pub fn set(&self, index: usize) -> Option<&CacheSet> {
        self.sets.get(index)
    }

    /// Number of valid lines across all sets.
    pub fn valid_lines(&self) -> usize {
        self.sets.iter().map(CacheSet::valid_count).sum()
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// Associativity (lines per set).
    pub const fn ways(&self) -> usize {
        self.config.ways
    }

    /// Block size in bytes.
    pub const fn block_size(&self) -> u64 {
        self.config.block_bytes
    }

    /// Total capacity in lines (`ways * num_sets`).
    pub fn capacity_lines(&self) -> usize {
        self.config.ways * self.sets.len()
    }

    /// Width of the block-offset field.
    pub const fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    /// Width of the set-index field.
    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Width of the tag field for the configured address width.
    pub const fn tag_bits(&self) -> u32 {
        self.config.address_bits - self.offset_bits - self.index_bits
    }

    /// Display name of the active replacement policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}

impl fmt::Debug for CacheSim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSim")
            .field("config", &self.config)
            .field("policy", &self.policy.name())
            .field("sequence", &self.sequence)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
