/*!
 * Process Module
 * Process lifecycle, execution contexts, and round-robin scheduling
 */

pub mod context;
pub mod manager;
pub mod manager_builder;
pub mod pcb;
pub mod registry;
pub mod scheduler;
pub mod switch;
pub mod table;
pub mod types;

// Re-export for convenience
pub use context::{ExecutionContext, Stack, DEFAULT_RFLAGS};
pub use manager::ProcessManager;
pub use manager_builder::ProcessManagerBuilder;
pub use pcb::ProcessControlBlock;
pub use registry::ProcessRegistry;
pub use scheduler::RoundRobin;
pub use switch::{ContextSwitch, Outgoing, RecordingSwitch, SimulatedCpu, SwitchRecord};
pub use table::ProcessTable;
pub use types::{
    EntryPoint, Priority, ProcessResult, ProcessSnapshot, ProcessState, SchedulerStats,
    SwitchOutcome,
};
