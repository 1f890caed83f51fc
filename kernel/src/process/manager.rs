/*!
 * Process Manager
 * Shared, lock-guarded handle over the process registry
 */

use super::manager_builder::ProcessManagerBuilder;
use super::registry::ProcessRegistry;
use super::table::ProcessTable;
use super::types::{
    EntryPoint, Priority, ProcessResult, ProcessSnapshot, SchedulerStats, SwitchOutcome,
};
use crate::core::types::Pid;
use crate::memory::BlockManager;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::instrument;

/// Process manager
///
/// Every operation runs with the registry lock held, so the
/// read-current/scan/mutate/switch sequence of a scheduling point is never
/// interleaved with another caller. Clones share the same registry.
#[derive(Clone)]
pub struct ProcessManager {
    pub(super) registry: Arc<Mutex<ProcessRegistry>>,
    pub(super) memory_manager: Option<BlockManager>,
}

impl ProcessManager {
    /// Create a builder for configuring the ProcessManager
    pub fn builder() -> ProcessManagerBuilder {
        ProcessManagerBuilder::new()
    }

    #[instrument(skip(self), fields(entry = %entry_point))]
    pub fn create(
        &self,
        name: &str,
        entry_point: EntryPoint,
        priority: Priority,
    ) -> ProcessResult<Pid> {
        self.registry.lock().create(name, entry_point, priority)
    }

    /// Terminate `pid`; unknown ids are a no-op
    #[instrument(skip(self))]
    pub fn terminate(&self, pid: Pid) -> ProcessResult<Option<SwitchOutcome>> {
        self.registry.lock().terminate(pid)
    }

    #[instrument(skip(self), level = "debug")]
    pub fn schedule(&self) -> ProcessResult<SwitchOutcome> {
        self.registry.lock().schedule()
    }

    pub fn yield_now(&self) -> ProcessResult<SwitchOutcome> {
        self.schedule()
    }

    /// Snapshot of the running process
    pub fn current(&self) -> ProcessResult<ProcessSnapshot> {
        let registry = self.registry.lock();
        let pid = registry.current().map(|pcb| pcb.id())?;
        registry.snapshot(pid)
    }

    pub fn current_id(&self) -> Pid {
        self.registry.lock().current_id()
    }

    pub fn get(&self, pid: Pid) -> ProcessResult<ProcessSnapshot> {
        self.registry.lock().snapshot(pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.registry.lock().contains(pid)
    }

    /// Consistent snapshot of all live processes in slot order
    pub fn list(&self) -> Vec<ProcessSnapshot> {
        self.registry.lock().list()
    }

    /// `ps`-style view of the current table
    pub fn table(&self) -> ProcessTable {
        ProcessTable::new(self.list())
    }

    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.registry.lock().capacity()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.registry.lock().stats()
    }

    /// Memory manager backing process stacks, if one was supplied
    pub fn memory_manager(&self) -> Option<&BlockManager> {
        self.memory_manager.as_ref()
    }

    /// Run `f` with exclusive access to the registry
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut ProcessRegistry) -> R) -> R {
        f(&mut self.registry.lock())
    }
}

impl std::fmt::Debug for ProcessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessManager")
            .field("registry", &*self.registry.lock())
            .finish()
    }
}
