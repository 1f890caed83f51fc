/*!
 * Context Switch Primitive
 *
 * The registry hands every context transfer to a `ContextSwitch`
 * implementation. On hardware this is the architecture's register
 * save/restore routine, which does not return to its caller until the
 * outgoing process is scheduled again. Host builds use the implementations
 * below, which model the transfer without touching real registers.
 */

use super::context::ExecutionContext;
use crate::core::types::Pid;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Outgoing side of a context transfer
pub struct Outgoing<'a> {
    pub pid: Pid,
    /// Where the outgoing register set must be captured
    pub save: &'a mut ExecutionContext,
}

/// Architecture-specific context transfer
///
/// `outgoing` is `None` when the previous process no longer exists (it
/// terminated itself); its registers must not be captured and it will never
/// be resumed. Implementations must complete the transfer atomically with
/// respect to the scheduler: the registry does not look at either context
/// again until the next scheduling point.
pub trait ContextSwitch: Send {
    fn switch(&mut self, outgoing: Option<Outgoing<'_>>, to: Pid, next: &ExecutionContext);
}

/// One recorded transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRecord {
    pub from: Option<Pid>,
    pub to: Pid,
    pub stack_pointer: u64,
    pub instruction_pointer: u64,
}

/// Test double that records "would have switched to X"
///
/// Clones share the same log, so a handle kept by a test observes switches
/// performed by the registry that owns the other clone.
#[derive(Debug, Clone, Default)]
pub struct RecordingSwitch {
    log: Arc<Mutex<Vec<SwitchRecord>>>,
}

impl RecordingSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// All transfers so far, oldest first
    pub fn records(&self) -> Vec<SwitchRecord> {
        self.log.lock().clone()
    }

    /// Targets of all transfers so far
    pub fn targets(&self) -> Vec<Pid> {
        self.log.lock().iter().map(|r| r.to).collect()
    }

    pub fn last(&self) -> Option<SwitchRecord> {
        self.log.lock().last().copied()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }
}

impl ContextSwitch for RecordingSwitch {
    fn switch(&mut self, outgoing: Option<Outgoing<'_>>, to: Pid, next: &ExecutionContext) {
        self.log.lock().push(SwitchRecord {
            from: outgoing.map(|o| o.pid),
            to,
            stack_pointer: next.rsp,
            instruction_pointer: next.rip,
        });
    }
}

/// Simulated single CPU
///
/// Keeps the register set "loaded on the CPU". A switch captures it into the
/// outgoing PCB and loads the incoming context, which is what the hardware
/// routine does minus the jump.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCpu {
    registers: Arc<Mutex<ExecutionContext>>,
    running: Arc<Mutex<Option<Pid>>>,
}

impl SimulatedCpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register set currently loaded
    pub fn registers(&self) -> ExecutionContext {
        *self.registers.lock()
    }

    /// Process whose context is loaded, if any switch happened yet
    pub fn running(&self) -> Option<Pid> {
        *self.running.lock()
    }

    /// Let the loaded process make progress
    pub fn execute(&self, f: impl FnOnce(&mut ExecutionContext)) {
        f(&mut self.registers.lock());
    }
}

impl ContextSwitch for SimulatedCpu {
    fn switch(&mut self, outgoing: Option<Outgoing<'_>>, to: Pid, next: &ExecutionContext) {
        let mut registers = self.registers.lock();
        if let Some(out) = outgoing {
            *out.save = *registers;
            trace!(from = out.pid, to, rsp = registers.rsp, "Captured outgoing context");
        }
        *registers = *next;
        *self.running.lock() = Some(to);
        trace!(to, rip = next.rip, rsp = next.rsp, "Loaded incoming context");
    }
}
