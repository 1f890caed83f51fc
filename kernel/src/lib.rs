/*!
 * Process Core Kernel Library
 * Process lifecycle and round-robin scheduling core exposed as a library
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod process;

// Re-exports
pub use crate::core::{
    ConfigError, InlineString, KernelConfig, KernelError, Pid, ProcessError, Result,
};
pub use memory::{BlockAllocator, BlockManager, MemoryError, MemoryInfo, MemoryStats, Region};
pub use monitoring::init_tracing;
pub use process::{
    ContextSwitch, EntryPoint, ExecutionContext, Priority, ProcessManager, ProcessManagerBuilder,
    ProcessRegistry, ProcessSnapshot, ProcessState, ProcessTable, RecordingSwitch,
    SchedulerStats, SimulatedCpu, SwitchOutcome,
};
