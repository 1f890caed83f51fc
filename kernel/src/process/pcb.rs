/*!
 * Process Control Block
 * Complete lifecycle state of one process
 */

use super::context::{ExecutionContext, Stack};
use super::types::{EntryPoint, Priority, ProcessSnapshot, ProcessState};
use crate::core::data_structures::InlineString;
use crate::core::limits::{KERNEL_PID, KERNEL_PROCESS_NAME};
use crate::core::types::{Pid, Tick};

/// Process Control Block
///
/// An `Unused` slot is represented by a PCB with `id = 0` and no stack.
#[derive(Debug)]
pub struct ProcessControlBlock {
    pub(super) id: Pid,
    pub(super) parent_id: Pid,
    pub(super) priority: Priority,
    pub(super) state: ProcessState,
    pub(super) stack: Option<Stack>,
    pub(super) entry_point: EntryPoint,
    pub(super) name: InlineString,
    pub(super) context: ExecutionContext,
    pub(super) dispatch_count: u64,
    pub(super) created_at: Tick,
}

impl ProcessControlBlock {
    /// Empty slot
    pub(super) fn unused() -> Self {
        Self {
            id: 0,
            parent_id: 0,
            priority: Priority::default(),
            state: ProcessState::Unused,
            stack: None,
            entry_point: EntryPoint::default(),
            name: InlineString::new(),
            context: ExecutionContext::default(),
            dispatch_count: 0,
            created_at: 0,
        }
    }

    /// PCB of the kernel itself, running from boot on its own stack
    pub(super) fn kernel() -> Self {
        Self {
            id: KERNEL_PID,
            parent_id: KERNEL_PID,
            priority: Priority::Kernel,
            state: ProcessState::Running,
            stack: None,
            entry_point: EntryPoint::default(),
            name: InlineString::from_static(KERNEL_PROCESS_NAME),
            context: ExecutionContext::default(),
            dispatch_count: 1,
            created_at: 0,
        }
    }

    /// Freshly created process, ready to be scheduled
    #[allow(clippy::too_many_arguments)]
    pub(super) fn ready(
        id: Pid,
        parent_id: Pid,
        name: InlineString,
        priority: Priority,
        entry_point: EntryPoint,
        stack: Stack,
        context: ExecutionContext,
        created_at: Tick,
    ) -> Self {
        Self {
            id,
            parent_id,
            priority,
            state: ProcessState::Ready,
            stack: Some(stack),
            entry_point,
            name,
            context,
            dispatch_count: 0,
            created_at,
        }
    }

    #[inline]
    pub fn id(&self) -> Pid {
        self.id
    }

    #[inline]
    pub fn parent_id(&self) -> Pid {
        self.parent_id
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[inline]
    pub fn entry_point(&self) -> EntryPoint {
        self.entry_point
    }

    #[inline]
    pub fn stack(&self) -> Option<&Stack> {
        self.stack.as_ref()
    }

    #[inline]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Times this process has been switched in
    #[inline]
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    #[inline]
    pub fn created_at(&self) -> Tick {
        self.created_at
    }

    #[inline]
    pub fn is_unused(&self) -> bool {
        self.state == ProcessState::Unused
    }

    pub(super) fn snapshot(&self, slot: usize) -> ProcessSnapshot {
        ProcessSnapshot {
            pid: self.id,
            parent_pid: self.parent_id,
            name: self.name.clone(),
            state: self.state,
            priority: self.priority,
            slot,
            stack: self.stack.as_ref().map(Stack::region),
            entry_point: self.entry_point,
            stack_pointer: self.context.stack_pointer(),
            dispatch_count: self.dispatch_count,
            created_at: self.created_at,
        }
    }
}
