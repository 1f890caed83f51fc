/*!
 * Block Memory Management
 *
 * Fixed-size block allocator backing process stacks.
 *
 * ## Layout
 *
 * The pool is `total_blocks` blocks of `block_size` bytes starting at
 * `POOL_BASE_ADDRESS`. Free space is tracked as address-ordered runs of
 * blocks:
 * - **Allocation**: first fit, splitting the chosen run
 * - **Free**: the run is merged with its neighbours, so a pool returns to a
 *   single run once everything is released
 * - **Accounting**: outstanding blocks, peak usage, and per-region sizes for
 *   validating frees
 */

mod allocator;
mod free_list;

use super::traits::{BlockAllocator, MemoryInfo};
use super::types::{MemoryStats, Region};
use crate::core::limits::{BLOCK_SIZE, DEFAULT_MEMORY_POOL, POOL_BASE_ADDRESS};
use crate::core::types::{Address, Size};
use crate::core::KernelConfig;
use ahash::RandomState;
use free_list::FreeRunList;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Pool state guarded by the manager's lock
#[derive(Debug)]
pub(super) struct BlockPool {
    pub(super) base: Address,
    pub(super) block_size: Size,
    pub(super) total_blocks: usize,
    pub(super) free: FreeRunList,
    /// Outstanding allocations: first block index -> block count
    pub(super) allocated: HashMap<usize, usize, RandomState>,
    pub(super) used_blocks: usize,
    pub(super) peak_blocks: usize,
}

impl BlockPool {
    #[inline]
    pub(super) fn address_of(&self, block: usize) -> Address {
        self.base + block * self.block_size
    }

    #[inline]
    pub(super) fn block_of(&self, address: Address) -> Option<usize> {
        let offset = address.checked_sub(self.base)?;
        if offset % self.block_size != 0 {
            return None;
        }
        let block = offset / self.block_size;
        (block < self.total_blocks).then_some(block)
    }
}

/// Block memory manager
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct BlockManager {
    pub(super) pool: Arc<Mutex<BlockPool>>,
}

impl BlockManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_POOL)
    }

    /// Create a manager for `total` bytes of 4KB blocks (useful for testing)
    pub fn with_capacity(total: Size) -> Self {
        Self::with_geometry(total / BLOCK_SIZE, BLOCK_SIZE)
    }

    /// Create a manager sized from the kernel configuration
    pub fn from_config(config: &KernelConfig) -> Self {
        Self::with_geometry(config.pool_blocks(), config.block_size)
    }

    /// Create a manager for `total_blocks` blocks of `block_size` bytes
    pub fn with_geometry(total_blocks: usize, block_size: Size) -> Self {
        info!(
            total_blocks,
            block_size,
            total_bytes = total_blocks * block_size,
            "Block manager initialized"
        );
        Self {
            pool: Arc::new(Mutex::new(BlockPool {
                base: POOL_BASE_ADDRESS,
                block_size,
                total_blocks,
                free: FreeRunList::new(total_blocks),
                allocated: HashMap::with_hasher(RandomState::new()),
                used_blocks: 0,
                peak_blocks: 0,
            })),
        }
    }

    /// Bytes currently handed out
    pub fn outstanding_bytes(&self) -> Size {
        let pool = self.pool.lock();
        pool.used_blocks * pool.block_size
    }

    /// Number of regions currently handed out
    pub fn outstanding_regions(&self) -> usize {
        self.pool.lock().allocated.len()
    }

    /// Check if `region` is an outstanding allocation of this manager
    pub fn is_allocated(&self, region: &Region) -> bool {
        let pool = self.pool.lock();
        match pool.block_of(region.base) {
            Some(block) => pool
                .allocated
                .get(&block)
                .map_or(false, |&count| count * pool.block_size == region.size),
            None => false,
        }
    }
}

impl Default for BlockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockAllocator for BlockManager {
    fn block_size(&self) -> Size {
        self.pool.lock().block_size
    }

    fn allocate_blocks(&self, count: usize) -> Option<Region> {
        self.reserve(count).ok()
    }

    fn free_blocks(&self, region: Region, count: usize) {
        if let Err(e) = self.release(region, count) {
            tracing::warn!(error = %e, base = region.base, "Ignoring invalid free");
        }
    }
}

impl MemoryInfo for BlockManager {
    fn stats(&self) -> MemoryStats {
        let pool = self.pool.lock();
        let total = pool.total_blocks * pool.block_size;
        let used = pool.used_blocks * pool.block_size;
        MemoryStats {
            total_memory: total,
            used_memory: used,
            available_memory: total - used,
            peak_memory: pool.peak_blocks * pool.block_size,
            usage_percentage: if total == 0 {
                0.0
            } else {
                used as f64 / total as f64 * 100.0
            },
            allocated_regions: pool.allocated.len(),
            free_runs: pool.free.len(),
        }
    }
}
