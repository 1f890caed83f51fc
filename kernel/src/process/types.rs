/*!
 * Process Types
 * Common types for process management
 */

use crate::core::data_structures::InlineString;
use crate::core::errors::ProcessError;
use crate::core::types::{Address, Pid, Tick};
use crate::memory::Region;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Slot holds no process
    Unused,
    /// Process is ready to run
    Ready,
    /// Process is currently running
    Running,
    /// Reserved for wait queues; nothing in the core produces it and the
    /// scheduler never selects it
    Blocked,
    /// Lifecycle end state. Termination recycles the slot to `Unused` in the
    /// same operation, so no snapshot ever reports it
    Terminated,
}

impl ProcessState {
    /// Whether a slot in this state holds a process
    #[inline]
    pub fn is_live(self) -> bool {
        !matches!(self, ProcessState::Unused | ProcessState::Terminated)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Unused => "unused",
            ProcessState::Ready => "ready",
            ProcessState::Running => "running",
            ProcessState::Blocked => "blocked",
            ProcessState::Terminated => "terminated",
        };
        f.pad(s)
    }
}

/// Process priority
///
/// Stored with every PCB and reported by introspection. The round-robin
/// scheduler does not consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Kernel,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Kernel => "kernel",
        };
        f.pad(s)
    }
}

impl FromStr for Priority {
    type Err = InlineString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "kernel" => Ok(Priority::Kernel),
            other => Err(format!("unknown priority '{}'", other).into()),
        }
    }
}

/// Address a new process starts executing at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryPoint(pub Address);

impl EntryPoint {
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    #[inline]
    pub const fn address(self) -> Address {
        self.0
    }
}

impl From<fn()> for EntryPoint {
    fn from(f: fn()) -> Self {
        Self(f as usize)
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Read-only copy of a PCB for introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessSnapshot {
    pub pid: Pid,
    pub parent_pid: Pid,
    pub name: InlineString,
    pub state: ProcessState,
    pub priority: Priority,
    pub slot: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Region>,
    pub entry_point: EntryPoint,
    pub stack_pointer: Address,
    pub dispatch_count: u64,
    pub created_at: Tick,
}

/// Result of one scheduling decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// No other process was ready; `pid` keeps running
    Idle { pid: Pid },
    /// Control moved from `from` to `to`
    Switched { from: Pid, to: Pid },
}

impl SwitchOutcome {
    /// Process running after the decision
    pub fn running(&self) -> Pid {
        match *self {
            SwitchOutcome::Idle { pid } => pid,
            SwitchOutcome::Switched { to, .. } => to,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SwitchOutcome::Idle { .. })
    }
}

/// Scheduler statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    /// Scheduling points (explicit calls plus reschedules after termination)
    pub ticks: u64,
    pub context_switches: u64,
    /// Scheduling points where nothing else was ready
    pub idle_ticks: u64,
    pub created: u64,
    pub terminated: u64,
    pub live_processes: usize,
    pub capacity: usize,
}
