//! Configuration records for the simulation engine.
//!
//! This module defines the configuration structures and enums used to
//! parameterize each simulator. It provides:
//! 1. **Defaults:** Baseline geometry for the cache, buddy arena and translator.
//! 2. **Structures:** One record per simulator plus a combined [`Config`].
//! 3. **Validation:** Checks that reject inconsistent geometry at construction.
//!
//! Every record derives `Deserialize` with per-field defaults so a host UI can
//! hand the engine a JSON document; use [`Config::from_json`] or the
//! `Default` implementations directly.

use serde::Deserialize;

use crate::common::{ADDRESS_WIDTH, ConfigError};

/// Default configuration constants for the engine.
mod defaults {
    /// Default cache size in bytes (2 KiB: 8 sets of 4 x 64-byte ways).
    pub const CACHE_SIZE: u64 = 2048;

    /// Default cache block size in bytes.
    pub const CACHE_BLOCK: u64 = 64;

    /// Default cache associativity.
    pub const CACHE_WAYS: usize = 4;

    /// Default address width used to report tag widths.
    pub const CACHE_ADDRESS_BITS: u32 = 32;

    /// Default seed for the Random replacement policy.
    pub const CACHE_SEED: u64 = 0x5EED_CAC4E;

    /// Default buddy arena size in bytes (1 KiB).
    pub const BUDDY_TOTAL: u64 = 1024;

    /// Default smallest block the buddy allocator hands out.
    pub const BUDDY_MIN_BLOCK: u64 = 1;

    /// Default page size in bytes (4 KiB).
    pub const PAGE_SIZE: u64 = 4096;

    /// Default number of page-table levels (x86-64 style 4-level walk).
    pub const PAGE_LEVELS: usize = 4;

    /// Default index width per page-table level (512-entry tables).
    pub const BITS_PER_LEVEL: u32 = 9;

    /// Default TLB capacity.
    pub const TLB_ENTRIES: usize = 16;

    /// Default NUMA node count.
    pub const NUMA_NODES: usize = 2;

    /// Default latency for a node-local frame.
    pub const NUMA_LOCAL_LATENCY: u64 = 100;

    /// Default latency for a frame homed on another node.
    pub const NUMA_REMOTE_LATENCY: u64 = 150;
}

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which cache line to evict
/// when a new line must be installed in a full cache set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used: hits refresh a line's age.
    #[default]
    #[serde(alias = "Lru", alias = "lru")]
    Lru,
    /// First In First Out: lines age from the moment they are filled.
    #[serde(alias = "Fifo", alias = "fifo")]
    Fifo,
    /// Uniform random victim drawn from an explicit, seedable source.
    #[serde(alias = "Random", alias = "random")]
    Random,
}

/// TLB replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TlbPolicy {
    /// Evict the entry that was inserted first.
    #[default]
    #[serde(alias = "Fifo", alias = "fifo")]
    Fifo,
    /// Evict the entry that was used least recently.
    #[serde(alias = "Lru", alias = "lru")]
    Lru,
}

/// How physical frames are distributed across NUMA nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePlacement {
    /// Consecutive frames rotate across nodes (`frame % nodes`).
    #[default]
    Interleaved,
    /// Each node owns a contiguous run of frames.
    Blocked {
        /// Frames per node before moving to the next one.
        frames_per_node: u64,
    },
}

/// Combined configuration for all three simulators.
///
/// # Examples
///
/// ```
/// use memsim_core::config::{Config, ReplacementPolicy};
///
/// let json = r#"{
///     "cache": { "size_bytes": 4096, "block_bytes": 32, "ways": 2, "policy": "FIFO" },
///     "buddy": { "total_bytes": 65536 },
///     "translator": { "levels": 2, "tlb_entries": 4 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cache.policy, ReplacementPolicy::Fifo);
/// assert_eq!(config.cache.num_sets().unwrap(), 64);
/// assert_eq!(config.translator.page_size, 4096);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Cache simulator configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Buddy allocator configuration
    #[serde(default)]
    pub buddy: BuddyConfig,
    /// Address translator configuration
    #[serde(default)]
    pub translator: TranslatorConfig,
}

impl Config {
    /// Parses a JSON document and validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or the first
    /// validation error found in the cache, buddy or translator section.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.cache.num_sets()?;
        self.buddy.validate()?;
        self.translator.validate()
    }
}

/// Set-associative cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: u64,

    /// Block (line) size in bytes
    #[serde(default = "CacheConfig::default_block", alias = "block_size")]
    pub block_bytes: u64,

    /// Associativity (number of ways per set)
    #[serde(default = "CacheConfig::default_ways", alias = "associativity")]
    pub ways: usize,

    /// Replacement policy
    #[serde(default)]
    pub policy: ReplacementPolicy,

    /// Address width in bits, used to report the tag width
    #[serde(default = "CacheConfig::default_address_bits")]
    pub address_bits: u32,

    /// Seed for the Random policy when no explicit source is injected
    #[serde(default = "CacheConfig::default_seed")]
    pub seed: u64,
}

impl CacheConfig {
    /// Returns the default cache size in bytes.
    const fn default_size() -> u64 {
        defaults::CACHE_SIZE
    }

    /// Returns the default block size in bytes.
    const fn default_block() -> u64 {
        defaults::CACHE_BLOCK
    }

    /// Returns the default associativity.
    const fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    /// Returns the default address width.
    const fn default_address_bits() -> u32 {
        defaults::CACHE_ADDRESS_BITS
    }

    /// Returns the default Random-policy seed.
    const fn default_seed() -> u64 {
        defaults::CACHE_SEED
    }

    /// Builds a configuration from the three geometry parameters and a policy,
    /// leaving the address width and seed at their defaults.
    pub const fn new(
        size_bytes: u64,
        block_bytes: u64,
        ways: usize,
        policy: ReplacementPolicy,
    ) -> Self {
        Self {
            size_bytes,
            block_bytes,
            ways,
            policy,
            address_bits: defaults::CACHE_ADDRESS_BITS,
            seed: defaults::CACHE_SEED,
        }
    }

    /// Validates the geometry and returns the number of sets.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Zero`] for a zero size, block size or associativity.
    /// - [`ConfigError::NotPowerOfTwo`] if the block size or derived set count
    ///   is not a power of two.
    /// - [`ConfigError::Indivisible`] if the size is not a whole number of sets.
    /// - [`ConfigError::OutOfRange`] if the address width cannot hold the offset and index bits.
    pub fn num_sets(&self) -> Result<usize, ConfigError> {
        if self.size_bytes == 0 {
            return Err(ConfigError::Zero { field: "size_bytes" });
        }
        if self.block_bytes == 0 {
            return Err(ConfigError::Zero { field: "block_bytes" });
        }
        if self.ways == 0 {
            return Err(ConfigError::Zero { field: "ways" });
        }
        if !self.block_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "block_bytes",
                value: self.block_bytes,
            });
        }

        let ways = self.ways as u64;
        let set_bytes = self
            .block_bytes
            .checked_mul(ways)
            .filter(|&bytes| self.size_bytes % bytes == 0)
            .ok_or(ConfigError::Indivisible {
                size: self.size_bytes,
                block: self.block_bytes,
                ways,
            })?;

        let sets = self.size_bytes / set_bytes;
        if !sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "num_sets",
                value: sets,
            });
        }

        let used_bits = self.block_bytes.trailing_zeros() + sets.trailing_zeros();
        if self.address_bits > ADDRESS_WIDTH || self.address_bits < used_bits {
            return Err(ConfigError::OutOfRange {
                field: "address_bits",
                value: u64::from(self.address_bits),
                max: u64::from(ADDRESS_WIDTH),
            });
        }

        Ok(sets as usize)
    }
}

impl Default for CacheConfig {
    /// A 2 KiB, 4-way cache with 64-byte blocks and LRU replacement (8 sets).
    fn default() -> Self {
        Self::new(
            defaults::CACHE_SIZE,
            defaults::CACHE_BLOCK,
            defaults::CACHE_WAYS,
            ReplacementPolicy::default(),
        )
    }
}

/// Buddy allocator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BuddyConfig {
    /// Arena size in bytes (power of two)
    #[serde(default = "BuddyConfig::default_total", alias = "total_size")]
    pub total_bytes: u64,

    /// Smallest block handed out (power of two, at most the arena size)
    #[serde(default = "BuddyConfig::default_min_block")]
    pub min_block_bytes: u64,
}

impl BuddyConfig {
    /// Returns the default arena size.
    const fn default_total() -> u64 {
        defaults::BUDDY_TOTAL
    }

    /// Returns the default minimum block size.
    const fn default_min_block() -> u64 {
        defaults::BUDDY_MIN_BLOCK
    }

    /// Builds a configuration for an arena of `total_bytes` with the default minimum block.
    pub const fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            min_block_bytes: defaults::BUDDY_MIN_BLOCK,
        }
    }

    /// Validates the arena geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`], [`ConfigError::NotPowerOfTwo`] or
    /// [`ConfigError::OutOfRange`] (minimum block larger than the arena).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("total_bytes", self.total_bytes),
            ("min_block_bytes", self.min_block_bytes),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
            if !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { field, value });
            }
        }
        if self.min_block_bytes > self.total_bytes {
            return Err(ConfigError::OutOfRange {
                field: "min_block_bytes",
                value: self.min_block_bytes,
                max: self.total_bytes,
            });
        }
        Ok(())
    }
}

impl Default for BuddyConfig {
    fn default() -> Self {
        Self::new(defaults::BUDDY_TOTAL)
    }
}

/// NUMA latency model attached to the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NumaConfig {
    /// Number of memory nodes
    #[serde(default = "NumaConfig::default_nodes")]
    pub nodes: usize,

    /// Node issuing the translated accesses
    #[serde(default)]
    pub requesting_node: usize,

    /// Latency reported for a frame homed on the requesting node
    #[serde(default = "NumaConfig::default_local_latency")]
    pub local_latency: u64,

    /// Latency reported for a frame homed on any other node
    #[serde(default = "NumaConfig::default_remote_latency")]
    pub remote_latency: u64,

    /// Frame-to-node placement
    #[serde(default)]
    pub placement: FramePlacement,
}

impl NumaConfig {
    /// Returns the default node count.
    const fn default_nodes() -> usize {
        defaults::NUMA_NODES
    }

    /// Returns the default local latency.
    const fn default_local_latency() -> u64 {
        defaults::NUMA_LOCAL_LATENCY
    }

    /// Returns the default remote latency.
    const fn default_remote_latency() -> u64 {
        defaults::NUMA_REMOTE_LATENCY
    }

    /// Validates the node topology.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`] for zero nodes or a zero blocked run length,
    /// and [`ConfigError::OutOfRange`] for a requesting node that does not exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes == 0 {
            return Err(ConfigError::Zero { field: "nodes" });
        }
        if self.requesting_node >= self.nodes {
            return Err(ConfigError::OutOfRange {
                field: "requesting_node",
                value: self.requesting_node as u64,
                max: self.nodes as u64 - 1,
            });
        }
        if let FramePlacement::Blocked { frames_per_node: 0 } = self.placement {
            return Err(ConfigError::Zero {
                field: "frames_per_node",
            });
        }
        Ok(())
    }
}

impl Default for NumaConfig {
    /// Two nodes, requesting from node 0, interleaved frames.
    fn default() -> Self {
        Self {
            nodes: defaults::NUMA_NODES,
            requesting_node: 0,
            local_latency: defaults::NUMA_LOCAL_LATENCY,
            remote_latency: defaults::NUMA_REMOTE_LATENCY,
            placement: FramePlacement::default(),
        }
    }
}

/// Address translator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TranslatorConfig {
    /// Page size in bytes (power of two)
    #[serde(default = "TranslatorConfig::default_page_size")]
    pub page_size: u64,

    /// Number of page-table levels walked on a TLB miss
    #[serde(default = "TranslatorConfig::default_levels")]
    pub levels: usize,

    /// Index width of each page-table level, in bits
    #[serde(default = "TranslatorConfig::default_bits_per_level")]
    pub bits_per_level: u32,

    /// TLB capacity in entries
    #[serde(default = "TranslatorConfig::default_tlb_entries")]
    pub tlb_entries: usize,

    /// TLB replacement policy
    #[serde(default)]
    pub tlb_policy: TlbPolicy,

    /// Optional NUMA latency model
    #[serde(default)]
    pub numa: Option<NumaConfig>,
}

impl TranslatorConfig {
    /// Returns the default page size.
    const fn default_page_size() -> u64 {
        defaults::PAGE_SIZE
    }

    /// Returns the default number of levels.
    const fn default_levels() -> usize {
        defaults::PAGE_LEVELS
    }

    /// Returns the default per-level index width.
    const fn default_bits_per_level() -> u32 {
        defaults::BITS_PER_LEVEL
    }

    /// Returns the default TLB capacity.
    const fn default_tlb_entries() -> usize {
        defaults::TLB_ENTRIES
    }

    /// Returns a copy of this configuration with a NUMA model attached.
    #[must_use]
    pub const fn with_numa(mut self, numa: NumaConfig) -> Self {
        self.numa = Some(numa);
        self
    }

    /// Validates the page geometry, TLB capacity and NUMA model.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Zero { field: "page_size" });
        }
        if !self.page_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "page_size",
                value: self.page_size,
            });
        }
        if self.levels == 0 {
            return Err(ConfigError::Zero { field: "levels" });
        }
        if self.bits_per_level == 0 {
            return Err(ConfigError::Zero {
                field: "bits_per_level",
            });
        }
        if self.tlb_entries == 0 {
            return Err(ConfigError::Zero {
                field: "tlb_entries",
            });
        }

        let width = (self.levels as u64)
            .saturating_mul(u64::from(self.bits_per_level))
            .saturating_add(u64::from(self.page_size.trailing_zeros()));
        if width > u64::from(ADDRESS_WIDTH) {
            return Err(ConfigError::OutOfRange {
                field: "virtual_address_bits",
                value: width,
                max: u64::from(ADDRESS_WIDTH),
            });
        }

        match &self.numa {
            Some(numa) => numa.validate(),
            None => Ok(()),
        }
    }
}

impl Default for TranslatorConfig {
    /// 4 KiB pages, four 9-bit levels (48-bit virtual addresses), 16-entry FIFO TLB, no NUMA model.
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            levels: defaults::PAGE_LEVELS,
            bits_per_level: defaults::BITS_PER_LEVEL,
            tlb_entries: defaults::TLB_ENTRIES,
            tlb_policy: TlbPolicy::default(),
            numa: None,
        }
    }
}
