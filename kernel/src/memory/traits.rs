/*!
 * Memory Traits
 * Block allocation seam consumed by the process registry
 */

use super::types::*;
use crate::core::types::Size;

/// Fixed-size block allocator
///
/// The process registry obtains every stack through this interface. Failure
/// is reported as `None`, never by panicking.
pub trait BlockAllocator: Send + Sync {
    /// Size in bytes of one block
    fn block_size(&self) -> Size;

    /// Allocate `count` contiguous blocks
    fn allocate_blocks(&self, count: usize) -> Option<Region>;

    /// Return a region previously obtained from `allocate_blocks(count)`
    fn free_blocks(&self, region: Region, count: usize);
}

/// Memory statistics provider
pub trait MemoryInfo: Send + Sync {
    /// Get overall memory statistics
    fn stats(&self) -> MemoryStats;

    /// Get memory info as (total, used, available)
    fn info(&self) -> (Size, Size, Size) {
        let stats = self.stats();
        (
            stats.total_memory,
            stats.used_memory,
            stats.available_memory,
        )
    }

    /// Get memory pressure level
    fn pressure(&self) -> MemoryPressure {
        self.stats().memory_pressure()
    }
}
