//! Buddy Memory Allocator.
//!
//! Manages a power-of-two arena as a tree of blocks. Allocation rounds the
//! request up to a power of two and splits the smallest sufficient free block
//! in half until a block of exactly that size exists; freeing a block merges it
//! with its buddy for as long as the buddy is free and the same size.
//!
//! Blocks live in an index arena. Splitting places two children in free slots
//! and leaves the parent in place as an interior node; merging retires both
//! children and turns the parent back into a free leaf. Retired slots are
//! recycled by later splits, so the arena never holds more slots than the
//! deepest tree it has had to represent. Every reuse bumps the slot's
//! generation, so a stale id can never name an unrelated block.
//!
//! The live leaves always partition the arena: their sizes sum to the arena
//! size and their extents neither overlap nor leave gaps.

use std::fmt;

use tracing::{debug, trace};

use crate::common::{AllocationError, ConfigError, FreeError};
use crate::config::BuddyConfig;
use crate::stats::AllocatorStats;

/// Handle naming a block of the arena.
///
/// A handle is a slot index plus the slot's generation when the block was
/// created. Slots are recycled after merges; the generation tells a recycled
/// slot apart from the block that used to live there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId {
    index: usize,
    generation: u32,
}

impl BlockId {
    const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot of the block in the allocator's arena.
    pub const fn index(self) -> usize {
        self.index
    }

    /// Number of times the slot had been recycled when this block was created.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)?;
        if self.generation > 0 {
            write!(f, "@{}", self.generation)?;
        }
        Ok(())
    }
}

/// Lifecycle state of an arena node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeState {
    /// Live leaf available for allocation.
    Free,
    /// Live leaf handed out for a request of `requested` bytes.
    Allocated { requested: u64 },
    /// Interior node whose extent is covered by two children.
    Split,
    /// Child absorbed back into its parent.
    Merged,
}

#[derive(Clone, Copy, Debug)]
struct Node {
    offset: u64,
    size: u64,
    state: NodeState,
    buddy: Option<BlockId>,
    parent: Option<BlockId>,
    generation: u32,
}

impl Node {
    const fn is_live(&self) -> bool {
        matches!(self.state, NodeState::Free | NodeState::Allocated { .. })
    }
}

/// Snapshot of one live block of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBlock {
    /// Block handle.
    pub id: BlockId,
    /// Byte offset of the block within the arena.
    pub offset: u64,
    /// Block size in bytes (a power of two).
    pub size: u64,
    /// True if the block is handed out.
    pub allocated: bool,
    /// Bytes the caller asked for, for allocated blocks.
    pub requested: Option<u64>,
    /// Sibling created by the same split, or `None` for the root.
    pub buddy: Option<BlockId>,
}

impl MemoryBlock {
    /// One past the last byte of the block.
    pub const fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Power-of-two buddy allocator over a simulated arena.
#[derive(Clone, Debug)]
pub struct BuddyAllocator {
    config: BuddyConfig,
    nodes: Vec<Node>,
    retired: Vec<usize>,
    stats: AllocatorStats,
}

impl BuddyAllocator {
    /// Creates an allocator with one free block spanning the whole arena.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a zero or non-power-of-two arena, or a
    /// minimum block size that is invalid or larger than the arena.
    pub fn new(config: &BuddyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            total = config.total_bytes,
            min_block = config.min_block_bytes,
            "buddy arena constructed"
        );
        Ok(Self {
            config: *config,
            nodes: vec![Self::root(config.total_bytes)],
            retired: Vec::new(),
            stats: AllocatorStats::default(),
        })
    }

    /// Shorthand for an arena of `total_bytes` with the default minimum block.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `total_bytes` is zero or not a power of two.
    pub fn with_size(total_bytes: u64) -> Result<Self, ConfigError> {
        Self::new(&BuddyConfig::new(total_bytes))
    }

    const fn root(total: u64) -> Node {
        Node {
            offset: 0,
            size: total,
            state: NodeState::Free,
            buddy: None,
            parent: None,
            generation: 0,
        }
    }

    /// Size a request of `requested` bytes occupies, or `None` if it cannot be represented.
    pub fn rounded_size(&self, requested: u64) -> Option<u64> {
        requested
            .checked_next_power_of_two()
            .map(|size| size.max(self.config.min_block_bytes))
    }

    /// Allocates a block of at least `requested` bytes.
    ///
    /// The request rounds up to the next power of two (and at least the minimum
    /// block size). An exact-size free block is used if one exists; otherwise
    /// the smallest larger free block is split until one does. Ties go to the
    /// lowest address.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::ZeroSize`] for a zero-byte request.
    /// - [`AllocationError::OutOfMemory`] if no free block can hold the rounded size.
    pub fn allocate(&mut self, requested: u64) -> Result<BlockId, AllocationError> {
        let result = self.try_allocate(requested);
        match result {
            Ok(id) => {
                self.stats.allocations += 1;
                trace!(requested, block = %id, "buddy allocate");
            }
            Err(err) => {
                self.stats.failed_allocations += 1;
                debug!(requested, %err, "buddy allocate failed");
            }
        }
        result
    }

    fn try_allocate(&mut self, requested: u64) -> Result<BlockId, AllocationError> {
        if requested == 0 {
            return Err(AllocationError::ZeroSize);
        }
        let out_of_memory = |rounded| AllocationError::OutOfMemory { requested, rounded };

        let Some(rounded) = self.rounded_size(requested) else {
            return Err(out_of_memory(u64::MAX));
        };
        if rounded > self.config.total_bytes {
            return Err(out_of_memory(rounded));
        }

        let mut id = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.state == NodeState::Free && node.size >= rounded)
            .min_by_key(|(_, node)| (node.size, node.offset))
            .map(|(index, node)| BlockId::new(index, node.generation))
            .ok_or_else(|| out_of_memory(rounded))?;

        while self.nodes[id.index].size > rounded {
            id = self.split(id);
        }

        self.nodes[id.index].state = NodeState::Allocated { requested };
        Ok(id)
    }

    /// Splits a free block into two buddy-linked halves and returns the lower one.
    fn split(&mut self, id: BlockId) -> BlockId {
        let parent = self.nodes[id.index];
        let half = parent.size / 2;
        let lower = self.claim_slot();
        let upper = self.claim_slot();

        self.nodes[lower.index] = Node {
            offset: parent.offset,
            size: half,
            state: NodeState::Free,
            buddy: Some(upper),
            parent: Some(id),
            generation: lower.generation,
        };
        self.nodes[upper.index] = Node {
            offset: parent.offset + half,
            size: half,
            state: NodeState::Free,
            buddy: Some(lower),
            parent: Some(id),
            generation: upper.generation,
        };
        self.nodes[id.index].state = NodeState::Split;
        self.stats.splits += 1;

        debug!(
            block = %id,
            offset = parent.offset,
            size = parent.size,
            %lower,
            %upper,
            "buddy split"
        );
        lower
    }

    /// Reserves a slot for a new node, recycling a retired one when possible.
    ///
    /// The caller overwrites the slot; the returned id already carries the
    /// generation the new node must store.
    fn claim_slot(&mut self) -> BlockId {
        if let Some(index) = self.retired.pop() {
            let generation = self.nodes[index].generation.wrapping_add(1);
            return BlockId::new(index, generation);
        }
        let index = self.nodes.len();
        self.nodes.push(Self::root(0));
        BlockId::new(index, 0)
    }

    /// Frees an allocated block and coalesces it with its buddies.
    ///
    /// Coalescing is immediate: while the block's buddy is free and the same
    /// size, the pair merges into their parent and the check repeats one level up.
    ///
    /// # Errors
    ///
    /// - [`FreeError::UnknownBlock`] if the id was never issued by this allocator.
    /// - [`FreeError::DoubleFree`] if the block is not currently allocated,
    ///   including blocks already absorbed by coalescing and split blocks.
    pub fn free(&mut self, id: BlockId) -> Result<(), FreeError> {
        let result = self.try_free(id);
        match result {
            Ok(()) => self.stats.frees += 1,
            Err(err) => {
                self.stats.failed_frees += 1;
                debug!(block = %id, %err, "buddy free failed");
            }
        }
        result
    }

    fn try_free(&mut self, id: BlockId) -> Result<(), FreeError> {
        let node = self.nodes.get(id.index).ok_or(FreeError::UnknownBlock(id))?;
        if id.generation > node.generation {
            return Err(FreeError::UnknownBlock(id));
        }
        if id.generation < node.generation || !matches!(node.state, NodeState::Allocated { .. }) {
            return Err(FreeError::DoubleFree(id));
        }
        self.nodes[id.index].state = NodeState::Free;
        trace!(block = %id, "buddy free");

        let mut current = id;
        while let Some(parent) = self.mergeable_parent(current) {
            let node = self.nodes[current.index];
            if let Some(buddy) = node.buddy {
                self.retire(buddy);
            }
            self.retire(current);
            self.nodes[parent.index].state = NodeState::Free;
            self.stats.merges += 1;
            debug!(
                block = %current,
                %parent,
                size = self.nodes[parent.index].size,
                "buddy merge"
            );
            current = parent;
        }
        Ok(())
    }

    fn retire(&mut self, id: BlockId) {
        self.nodes[id.index].state = NodeState::Merged;
        self.retired.push(id.index);
    }

    /// Returns the parent of `id` if `id` and its recorded buddy can merge.
    fn mergeable_parent(&self, id: BlockId) -> Option<BlockId> {
        let node = self.nodes[id.index];
        let buddy = self.nodes[node.buddy?.index];
        let mergeable = node.state == NodeState::Free
            && buddy.state == NodeState::Free
            && buddy.size == node.size
            && buddy.parent == node.parent;
        if mergeable { node.parent } else { None }
    }

    /// Discards every block and returns to a single free arena, zeroing statistics.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(Self::root(self.config.total_bytes));
        self.retired.clear();
        self.stats = AllocatorStats::default();
        debug!("buddy arena reset");
    }

    fn snapshot(id: BlockId, node: &Node) -> MemoryBlock {
        let (allocated, requested) = match node.state {
            NodeState::Allocated { requested } => (true, Some(requested)),
            _ => (false, None),
        };
        MemoryBlock {
            id,
            offset: node.offset,
            size: node.size,
            allocated,
            requested,
            buddy: node.buddy,
        }
    }

    /// Live blocks ordered by address. Together they cover the arena exactly.
    pub fn blocks(&self) -> Vec<MemoryBlock> {
        let mut blocks: Vec<MemoryBlock> = self
            .live()
            .map(|(id, node)| Self::snapshot(id, node))
            .collect();
        blocks.sort_by_key(|block| block.offset);
        blocks
    }

    /// The live block named by `id`, if it is currently part of the partition.
    pub fn block(&self, id: BlockId) -> Option<MemoryBlock> {
        self.nodes
            .get(id.index)
            .filter(|node| node.generation == id.generation && node.is_live())
            .map(|node| Self::snapshot(id, node))
    }

    fn live(&self) -> impl Iterator<Item = (BlockId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_live())
            .map(|(index, node)| (BlockId::new(index, node.generation), node))
    }

    /// Arena slots in use, counting interior and retired nodes.
    ///
    /// Bounded by the largest tree the allocator has had to hold at once,
    /// not by the number of operations performed.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Arena size in bytes.
    pub const fn total_size(&self) -> u64 {
        self.config.total_bytes
    }

    /// The configuration this allocator was built from.
    pub const fn config(&self) -> &BuddyConfig {
        &self.config
    }

    /// Bytes held by free blocks.
    pub fn free_bytes(&self) -> u64 {
        self.live()
            .filter(|(_, node)| node.state == NodeState::Free)
            .map(|(_, node)| node.size)
            .sum()
    }

    /// Bytes held by allocated blocks (rounded sizes).
    pub fn allocated_bytes(&self) -> u64 {
        self.config.total_bytes - self.free_bytes()
    }

    /// Bytes the callers actually asked for across live allocations.
    pub fn requested_bytes(&self) -> u64 {
        self.live()
            .filter_map(|(_, node)| match node.state {
                NodeState::Allocated { requested } => Some(requested),
                _ => None,
            })
            .sum()
    }

    /// Size of the largest free block, or `None` when the arena is fully allocated.
    pub fn largest_free_block(&self) -> Option<u64> {
        self.live()
            .filter(|(_, node)| node.state == NodeState::Free)
            .map(|(_, node)| node.size)
            .max()
    }

    /// External fragmentation: `1 - largest_free / total_free`.
    ///
    /// 0 when all free memory is one block or nothing is free; approaches 1 as
    /// free memory scatters into many small blocks.
    pub fn fragmentation_ratio(&self) -> f64 {
        let free = self.free_bytes();
        match self.largest_free_block() {
            Some(largest) if free > 0 => 1.0 - largest as f64 / free as f64,
            _ => 0.0,
        }
    }

    /// Internal fragmentation: share of allocated bytes lost to rounding.
    ///
    /// 0 when nothing is allocated.
    pub fn internal_fragmentation(&self) -> f64 {
        let allocated = self.allocated_bytes();
        if allocated == 0 {
            0.0
        } else {
            1.0 - self.requested_bytes() as f64 / allocated as f64
        }
    }

    /// Cumulative allocator statistics since construction or the last reset.
    pub const fn stats(&self) -> &AllocatorStats {
        &self.stats
    }
}
