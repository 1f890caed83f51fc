/*!
 * Process Registry
 *
 * Fixed-capacity table of PCB slots and the single source of truth for which
 * processes exist.
 *
 * ## Layout
 *
 * - Dense slot array; a live process keeps its slot index for its whole life
 * - Ordered set of free slot indices, so creation reuses the lowest free slot
 * - PID -> slot index map for O(1) lookup
 *
 * ## Invariants
 *
 * - Slot 0 holds the kernel PCB (pid 0) from construction on; it is never
 *   evicted, only descheduled to `Ready`
 * - Exactly one PCB is `Running`, and it is the one named by `current_id`
 * - Only live PCBs own a stack; a stack is released exactly once
 *
 * Every mutating operation takes `&mut self`. Callers that drive the
 * registry from more than one thread go through `ProcessManager`, which
 * serializes access.
 */

use super::context::Stack;
use super::pcb::ProcessControlBlock;
use super::scheduler::RoundRobin;
use super::switch::{ContextSwitch, Outgoing};
use super::types::{
    EntryPoint, Priority, ProcessResult, ProcessSnapshot, ProcessState, SchedulerStats,
    SwitchOutcome,
};
use crate::core::data_structures::InlineString;
use crate::core::errors::{ConfigError, ProcessError};
use crate::core::id::PidAllocator;
use crate::core::limits::{blocks_for, KERNEL_PID, KERNEL_SLOT, MAX_PROCESS_NAME_LEN};
use crate::core::types::{Pid, Size, Tick};
use crate::memory::BlockAllocator;
use ahash::RandomState;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fixed-capacity process table
pub struct ProcessRegistry {
    slots: Vec<ProcessControlBlock>,
    free_slots: BTreeSet<usize>,
    index: HashMap<Pid, usize, RandomState>,
    current_id: Pid,
    pids: PidAllocator,
    policy: RoundRobin,
    allocator: Arc<dyn BlockAllocator>,
    switch: Box<dyn ContextSwitch>,
    stack_size: Size,
    stack_blocks: usize,
    clock: Tick,
    stats: SchedulerStats,
}

impl ProcessRegistry {
    /// Boot the registry: every slot `Unused` except the running kernel PCB
    ///
    /// `capacity` counts the kernel slot and is raised to 1 if zero. Fails if
    /// the allocator reports a zero block size.
    pub fn new(
        capacity: usize,
        stack_size: Size,
        allocator: Arc<dyn BlockAllocator>,
        switch: Box<dyn ContextSwitch>,
    ) -> Result<Self, ConfigError> {
        let block_size = allocator.block_size();
        if block_size == 0 {
            return Err(ConfigError::invalid(
                "block_size",
                "allocator reports a zero block size",
            ));
        }

        let capacity = capacity.max(1);
        let mut slots: Vec<ProcessControlBlock> =
            (0..capacity).map(|_| ProcessControlBlock::unused()).collect();
        slots[KERNEL_SLOT] = ProcessControlBlock::kernel();

        let mut index = HashMap::with_capacity_and_hasher(capacity, RandomState::new());
        index.insert(KERNEL_PID, KERNEL_SLOT);

        let stack_blocks = blocks_for(stack_size, block_size);

        info!(
            capacity,
            stack_size, stack_blocks, "Process registry initialized with kernel PCB in slot 0"
        );

        Ok(Self {
            slots,
            free_slots: (1..capacity).collect(),
            index,
            current_id: KERNEL_PID,
            pids: PidAllocator::new(),
            policy: RoundRobin,
            allocator,
            switch,
            stack_size,
            stack_blocks,
            clock: 0,
            stats: SchedulerStats {
                live_processes: 1,
                capacity,
                ..SchedulerStats::default()
            },
        })
    }

    /// Start PID assignment at `next` instead of 1
    pub fn with_pid_allocator(mut self, pids: PidAllocator) -> Self {
        self.pids = pids;
        self
    }

    /// Create a process that starts at `entry_point`
    ///
    /// The new PCB is `Ready`; its parent is the current process. On failure
    /// the table and the allocator are left exactly as they were.
    pub fn create(
        &mut self,
        name: &str,
        entry_point: EntryPoint,
        priority: Priority,
    ) -> ProcessResult<Pid> {
        let capacity = self.slots.len();
        let Some(&slot) = self.free_slots.iter().next() else {
            warn!(capacity, name, "Process table full");
            return Err(ProcessError::ResourceExhausted { capacity });
        };

        let requested = self.stack_blocks * self.allocator.block_size();
        let Some(region) = self.allocator.allocate_blocks(self.stack_blocks) else {
            warn!(name, requested, "Stack allocation failed");
            return Err(ProcessError::OutOfMemory { requested });
        };

        let Some((stack, context)) =
            Stack::with_initial_frame(region, self.stack_blocks, entry_point)
        else {
            self.allocator.free_blocks(region, self.stack_blocks);
            error!(
                base = region.base,
                size = region.size,
                "Allocated stack cannot hold the initial frame"
            );
            return Err(ProcessError::OutOfMemory { requested });
        };

        let index = &self.index;
        let Some(pid) = self
            .pids
            .allocate(index.len() + 1, |candidate| index.contains_key(&candidate))
        else {
            let (region, blocks) = stack.into_region();
            self.allocator.free_blocks(region, blocks);
            return Err(ProcessError::InvariantViolation(
                "no free process id although a slot is free".into(),
            ));
        };

        let parent = self.current_id;
        self.slots[slot] = ProcessControlBlock::ready(
            pid,
            parent,
            InlineString::truncated(name, MAX_PROCESS_NAME_LEN),
            priority,
            entry_point,
            stack,
            context,
            self.clock,
        );
        self.free_slots.remove(&slot);
        self.index.insert(pid, slot);
        self.stats.created += 1;
        self.stats.live_processes += 1;

        info!(
            pid,
            parent,
            slot,
            name,
            %priority,
            entry = %entry_point,
            stack_base = region.base,
            "Process created"
        );
        Ok(pid)
    }

    /// Terminate a process and recycle its slot
    ///
    /// Unknown pids are ignored. Terminating the current process runs the
    /// scheduler before returning; the terminated context is never resumed.
    /// Returns the scheduling decision taken, if any.
    pub fn terminate(&mut self, pid: Pid) -> ProcessResult<Option<SwitchOutcome>> {
        if pid == KERNEL_PID {
            warn!("Refusing to terminate the kernel process");
            return Err(ProcessError::KernelProcess);
        }

        let Some(slot) = self.index.remove(&pid) else {
            debug!(pid, "Terminate of unknown process ignored");
            return Ok(None);
        };

        let pcb = &mut self.slots[slot];
        if let Some(stack) = pcb.stack.take() {
            let (region, blocks) = stack.into_region();
            self.allocator.free_blocks(region, blocks);
        }
        let name = std::mem::take(&mut pcb.name);
        self.slots[slot] = ProcessControlBlock::unused();
        self.free_slots.insert(slot);
        self.stats.terminated += 1;
        self.stats.live_processes -= 1;

        info!(pid, slot, name = %name, "Process terminated");

        if pid != self.current_id {
            return Ok(None);
        }

        // The old current slot is Unused now, so it is not demoted
        self.stats.ticks += 1;
        self.clock += 1;
        match self.policy.select(&self.slots, slot) {
            Some(next) => Ok(Some(self.dispatch(pid, None, next))),
            None => {
                error!(pid, "No runnable process left after terminating current");
                Err(ProcessError::InvariantViolation(
                    format!("current process {} terminated with nothing to run", pid).into(),
                ))
            }
        }
    }

    /// Scheduling point: hand the CPU to the next ready process
    ///
    /// Returns `Idle` when no other process is ready; the current process
    /// keeps running.
    pub fn schedule(&mut self) -> ProcessResult<SwitchOutcome> {
        self.stats.ticks += 1;
        self.clock += 1;

        let current = self.current_slot()?;
        let Some(next) = self.policy.select(&self.slots, current) else {
            self.stats.idle_ticks += 1;
            debug!(pid = self.current_id, "No other process ready");
            return Ok(SwitchOutcome::Idle {
                pid: self.current_id,
            });
        };

        Ok(self.dispatch(self.current_id, Some(current), next))
    }

    /// Voluntarily give up the CPU
    #[inline]
    pub fn yield_now(&mut self) -> ProcessResult<SwitchOutcome> {
        self.schedule()
    }

    /// PCB of the running process
    pub fn current(&self) -> ProcessResult<&ProcessControlBlock> {
        let slot = self.current_slot()?;
        Ok(&self.slots[slot])
    }

    #[inline]
    pub fn current_id(&self) -> Pid {
        self.current_id
    }

    /// PCB of a live process
    pub fn get(&self, pid: Pid) -> ProcessResult<&ProcessControlBlock> {
        self.index
            .get(&pid)
            .map(|&slot| &self.slots[slot])
            .ok_or(ProcessError::NotFound(pid))
    }

    /// Snapshot of a live process
    pub fn snapshot(&self, pid: Pid) -> ProcessResult<ProcessSnapshot> {
        self.index
            .get(&pid)
            .map(|&slot| self.slots[slot].snapshot(slot))
            .ok_or(ProcessError::NotFound(pid))
    }

    #[inline]
    pub fn contains(&self, pid: Pid) -> bool {
        self.index.contains_key(&pid)
    }

    /// Live PCBs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ProcessControlBlock)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, pcb)| !pcb.is_unused())
    }

    /// Snapshot of every live process in slot order
    pub fn list(&self) -> Vec<ProcessSnapshot> {
        self.iter().map(|(slot, pcb)| pcb.snapshot(slot)).collect()
    }

    /// Number of live processes, kernel included
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Always false: the kernel process is always present
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn stack_size(&self) -> Size {
        self.stack_size
    }

    /// Scheduling clock, advanced once per scheduling point
    #[inline]
    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats.clone()
    }

    fn current_slot(&self) -> ProcessResult<usize> {
        match self.index.get(&self.current_id) {
            Some(&slot) => Ok(slot),
            None => {
                error!(
                    current = self.current_id,
                    "Current process missing from table"
                );
                Err(ProcessError::InvariantViolation(
                    format!("current process {} not in table", self.current_id).into(),
                ))
            }
        }
    }

    /// Make `to` the running process and transfer control to it
    ///
    /// `from` is the pid giving up the CPU; `save` is its slot when it still
    /// exists and its registers must be captured.
    fn dispatch(&mut self, from: Pid, save: Option<usize>, to: usize) -> SwitchOutcome {
        if let Some(old) = save {
            let pcb = &mut self.slots[old];
            // Never resurrect a PCB that is not running
            if pcb.state == ProcessState::Running {
                pcb.state = ProcessState::Ready;
            }
        }

        let next = &mut self.slots[to];
        next.state = ProcessState::Running;
        next.dispatch_count += 1;
        let to_pid = next.id;
        let next_context = next.context;

        self.current_id = to_pid;
        self.stats.context_switches += 1;
        debug!(from, to = to_pid, slot = to, "Context switch");

        let outgoing = match save {
            Some(old) if old != to => Some(Outgoing {
                pid: from,
                save: &mut self.slots[old].context,
            }),
            _ => None,
        };
        self.switch.switch(outgoing, to_pid, &next_context);

        SwitchOutcome::Switched { from, to: to_pid }
    }
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("capacity", &self.slots.len())
            .field("live", &self.index.len())
            .field("current_id", &self.current_id)
            .field("clock", &self.clock)
            .finish()
    }
}
