/*!
 * System Limits and Constants
 *
 * Centralized location for registry capacity, stack geometry and allocator
 * sizing. Everything here is a default; `KernelConfig` can override it at
 * startup.
 */

use std::time::Duration;

// =============================================================================
// PROCESS REGISTRY
// =============================================================================

/// Number of PCB slots in the registry (kernel slot included)
pub const MAX_PROCESSES: usize = 256;

/// Reserved id of the always-present kernel process
pub const KERNEL_PID: u32 = 0;

/// Slot that holds the kernel PCB from boot
pub const KERNEL_SLOT: usize = 0;

/// Name reported for the kernel PCB
pub const KERNEL_PROCESS_NAME: &str = "kernel";

/// Longest process name kept in a PCB; longer names are truncated
pub const MAX_PROCESS_NAME_LEN: usize = 32;

// =============================================================================
// STACKS & MEMORY
// =============================================================================

/// Per-process stack size (64KB)
pub const STACK_SIZE: usize = 64 * 1024;

/// Allocation unit of the block allocator (4KB)
/// Aligned with common page size
pub const BLOCK_SIZE: usize = 4 * 1024;

/// Default memory pool handed to the block allocator (16MB)
/// Enough for the full registry of 64KB stacks
pub const DEFAULT_MEMORY_POOL: usize = 16 * 1024 * 1024;

/// Base address of the simulated block pool
pub const POOL_BASE_ADDRESS: usize = 0x0010_0000;

/// Stack alignment required by the initial frame
pub const STACK_ALIGNMENT: usize = 16;

/// General-purpose registers saved below the return address
pub const SAVED_GPR_COUNT: usize = 15;

/// Bytes written at the top of a new stack: entry point plus zeroed registers
pub const INITIAL_FRAME_SIZE: usize = (SAVED_GPR_COUNT + 1) * std::mem::size_of::<u64>();

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default timer tick driving the scheduler (10ms)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Number of blocks needed to hold `bytes`
#[inline]
pub const fn blocks_for(bytes: usize, block_size: usize) -> usize {
    (bytes + block_size - 1) / block_size
}
