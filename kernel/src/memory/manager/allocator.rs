/*!
 * Block Allocator Implementation
 * Allocation and deallocation logic
 */

use super::super::types::{MemoryError, MemoryPressure, MemoryResult, MemoryStats, Region};
use super::super::traits::MemoryInfo;
use super::free_list::FreeRun;
use super::BlockManager;
use tracing::{debug, error, warn};

impl BlockManager {
    /// Reserve `count` contiguous blocks
    pub fn reserve(&self, count: usize) -> MemoryResult<Region> {
        if count == 0 {
            return Err(MemoryError::ZeroSized);
        }

        let region = {
            let mut pool = self.pool.lock();
            let Some(start) = pool.free.take_first_fit(count) else {
                let available = pool.free.free_blocks();
                let largest_run = pool.free.largest_run();
                error!(
                    requested = count,
                    available, largest_run, "OOM: no contiguous run large enough"
                );
                return Err(MemoryError::OutOfMemory {
                    requested: count,
                    available,
                    largest_run,
                });
            };

            pool.allocated.insert(start, count);
            pool.used_blocks += count;
            pool.peak_blocks = pool.peak_blocks.max(pool.used_blocks);
            Region::new(pool.address_of(start), count * pool.block_size)
        };

        let stats = self.stats();
        if let Some(level) = check_pressure(&stats) {
            warn!(
                pressure = %level,
                base = region.base,
                size = region.size,
                usage = stats.usage_percentage,
                "Allocated region under memory pressure"
            );
        } else {
            debug!(base = region.base, size = region.size, "Allocated region");
        }

        Ok(region)
    }

    /// Release a region obtained from `reserve(count)`
    pub fn release(&self, region: Region, count: usize) -> MemoryResult<()> {
        let mut pool = self.pool.lock();

        let start = pool
            .block_of(region.base)
            .ok_or(MemoryError::InvalidRegion(region.base))?;
        let allocated = *pool
            .allocated
            .get(&start)
            .ok_or(MemoryError::InvalidRegion(region.base))?;

        if allocated != count || allocated * pool.block_size != region.size {
            return Err(MemoryError::BlockCountMismatch {
                address: region.base,
                allocated,
                freeing: count,
            });
        }

        let run = FreeRun {
            start,
            len: count,
        };
        if pool.free.overlaps(run) {
            // Accounting says allocated but the run list disagrees
            return Err(MemoryError::InvalidRegion(region.base));
        }

        pool.allocated.remove(&start);
        pool.free.insert(run);
        pool.used_blocks -= count;

        debug!(
            base = region.base,
            size = region.size,
            free_runs = pool.free.len(),
            "Released region"
        );
        Ok(())
    }
}

fn check_pressure(stats: &MemoryStats) -> Option<MemoryPressure> {
    match stats.memory_pressure() {
        MemoryPressure::Low => None,
        level => Some(level),
    }
}
