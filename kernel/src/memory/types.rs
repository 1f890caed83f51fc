/*!
 * Memory Types
 * Common types for block allocation
 */

use crate::core::types::{Address, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MemoryError {
    #[error("Out of memory: need {requested} blocks, {available} free ({largest_run} contiguous)")]
    #[diagnostic(
        code(memory::out_of_memory),
        help("Free regions or enlarge KERNEL_MEMORY_POOL.")
    )]
    OutOfMemory {
        requested: usize,
        available: usize,
        largest_run: usize,
    },

    #[error("Zero-sized allocation requested")]
    #[diagnostic(code(memory::zero_sized))]
    ZeroSized,

    #[error("Invalid region: 0x{0:x} is not an outstanding allocation")]
    #[diagnostic(
        code(memory::invalid_region),
        help("The region was never allocated here or has already been freed.")
    )]
    InvalidRegion(Address),

    #[error("Block count mismatch at 0x{address:x}: allocated {allocated}, freeing {freeing}")]
    #[diagnostic(code(memory::block_count_mismatch))]
    BlockCountMismatch {
        address: Address,
        allocated: usize,
        freeing: usize,
    },
}

/// Contiguous memory region handed out by a block allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub base: Address,
    pub size: Size,
}

impl Region {
    pub const fn new(base: Address, size: Size) -> Self {
        Self { base, size }
    }

    /// One past the highest address in the region
    #[inline]
    pub const fn top(&self) -> Address {
        self.base + self.size
    }

    #[inline]
    pub const fn contains(&self, address: Address) -> bool {
        address >= self.base && address < self.top()
    }
}

/// Memory statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_memory: usize,
    pub used_memory: usize,
    pub available_memory: usize,
    pub peak_memory: usize,
    pub usage_percentage: f64,
    pub allocated_regions: usize,
    pub free_runs: usize,
}

impl MemoryStats {
    pub fn memory_pressure(&self) -> MemoryPressure {
        if self.usage_percentage >= 95.0 {
            MemoryPressure::Critical
        } else if self.usage_percentage >= 80.0 {
            MemoryPressure::High
        } else if self.usage_percentage >= 60.0 {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
