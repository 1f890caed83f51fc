/*!
 * Process Manager Builder
 * Builder pattern for ProcessManager construction
 */

use super::manager::ProcessManager;
use super::registry::ProcessRegistry;
use super::switch::{ContextSwitch, RecordingSwitch};
use crate::core::config::KernelConfig;
use crate::core::errors::ConfigError;
use crate::core::id::PidAllocator;
use crate::core::types::Pid;
use crate::memory::{BlockAllocator, BlockManager};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Builder for ProcessManager
pub struct ProcessManagerBuilder {
    config: KernelConfig,
    memory_manager: Option<BlockManager>,
    allocator: Option<Arc<dyn BlockAllocator>>,
    switch: Option<Box<dyn ContextSwitch>>,
    first_pid: Option<Pid>,
}

impl ProcessManagerBuilder {
    /// Create a new ProcessManager builder
    pub fn new() -> Self {
        Self {
            config: KernelConfig::default(),
            memory_manager: None,
            allocator: None,
            switch: None,
            first_pid: None,
        }
    }

    /// Use table capacity and stack size from `config`
    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the table capacity (kernel slot included)
    pub fn with_capacity(mut self, max_processes: usize) -> Self {
        self.config.max_processes = max_processes;
        self
    }

    /// Allocate stacks from `memory_manager`
    pub fn with_memory_manager(mut self, memory_manager: BlockManager) -> Self {
        self.memory_manager = Some(memory_manager);
        self
    }

    /// Allocate stacks from an arbitrary block allocator
    pub fn with_allocator(mut self, allocator: Arc<dyn BlockAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Perform context transfers through `switch`
    pub fn with_switch(mut self, switch: impl ContextSwitch + 'static) -> Self {
        self.switch = Some(Box::new(switch));
        self
    }

    /// Start PID assignment at `pid`
    pub fn with_first_pid(mut self, pid: Pid) -> Self {
        self.first_pid = Some(pid);
        self
    }

    /// Build the ProcessManager
    ///
    /// Without an explicit allocator a `BlockManager` sized from the
    /// configuration is created; without a switch, a `RecordingSwitch`.
    /// Fails if the configuration does not validate or the allocator reports
    /// a zero block size.
    pub fn build(self) -> Result<ProcessManager, ConfigError> {
        self.config.validate()?;
        let mut features = Vec::new();

        let (allocator, memory_manager): (Arc<dyn BlockAllocator>, Option<BlockManager>) =
            match (self.allocator, self.memory_manager) {
                (Some(allocator), memory) => {
                    features.push("custom-allocator");
                    (allocator, memory)
                }
                (None, Some(memory)) => {
                    features.push("memory");
                    (Arc::new(memory.clone()), Some(memory))
                }
                (None, None) => {
                    let memory = BlockManager::from_config(&self.config);
                    features.push("memory");
                    (Arc::new(memory.clone()), Some(memory))
                }
            };

        let switch: Box<dyn ContextSwitch> = match self.switch {
            Some(switch) => {
                features.push("context-switch");
                switch
            }
            None => {
                features.push("recording-switch");
                Box::new(RecordingSwitch::new())
            }
        };

        let mut registry = ProcessRegistry::new(
            self.config.max_processes,
            self.config.stack_size,
            allocator,
            switch,
        )?;
        if let Some(pid) = self.first_pid {
            registry = registry.with_pid_allocator(PidAllocator::starting_at(pid));
        }

        info!(
            capacity = self.config.max_processes,
            "Process manager initialized with: {}",
            features.join(", ")
        );

        Ok(ProcessManager {
            registry: Arc::new(Mutex::new(registry)),
            memory_manager,
        })
    }
}

impl Default for ProcessManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
