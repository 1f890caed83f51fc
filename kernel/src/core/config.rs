/*!
 * Kernel Configuration
 *
 * Startup configuration for the process core. Defaults come from
 * `core::limits`; a deployment can override them through environment
 * variables or a JSON file named by `KERNEL_CONFIG`.
 */

use super::errors::ConfigError;
use super::limits::{
    blocks_for, BLOCK_SIZE, DEFAULT_MEMORY_POOL, DEFAULT_TICK_INTERVAL, INITIAL_FRAME_SIZE,
    MAX_PROCESSES, STACK_ALIGNMENT, STACK_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Environment variable naming a JSON configuration file
pub const CONFIG_PATH_ENV: &str = "KERNEL_CONFIG";

/// Process core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KernelConfig {
    /// Registry slots, kernel slot included
    pub max_processes: usize,
    /// Bytes of stack handed to every new process
    pub stack_size: usize,
    /// Allocation unit of the block allocator
    pub block_size: usize,
    /// Bytes managed by the block allocator
    pub memory_pool: usize,
    /// Period of the simulated timer interrupt, in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_processes: MAX_PROCESSES,
            stack_size: STACK_SIZE,
            block_size: BLOCK_SIZE,
            memory_pool: DEFAULT_MEMORY_POOL,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
        }
    }
}

impl KernelConfig {
    /// Small configuration for tests and demos
    pub const fn minimal(max_processes: usize) -> Self {
        Self {
            max_processes,
            stack_size: STACK_SIZE,
            block_size: BLOCK_SIZE,
            memory_pool: max_processes * STACK_SIZE,
            tick_interval_ms: 10,
        }
    }

    /// Load configuration from the environment
    ///
    /// If `KERNEL_CONFIG` is set the named JSON file provides the base values;
    /// individual `KERNEL_*` variables override them.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };

        if let Some(v) = read_env("KERNEL_MAX_PROCESSES")? {
            config.max_processes = v as usize;
        }
        if let Some(v) = read_env("KERNEL_STACK_SIZE")? {
            config.stack_size = v as usize;
        }
        if let Some(v) = read_env("KERNEL_BLOCK_SIZE")? {
            config.block_size = v as usize;
        }
        if let Some(v) = read_env("KERNEL_MEMORY_POOL")? {
            config.memory_pool = v as usize;
        }
        if let Some(v) = read_env("KERNEL_TICK_MS")? {
            config.tick_interval_ms = v;
        }

        config.validate()?;
        info!(
            max_processes = config.max_processes,
            stack_size = config.stack_size,
            block_size = config.block_size,
            memory_pool = config.memory_pool,
            "Kernel configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e).into()))?;
        let config: KernelConfig = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e).into()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the registry cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_processes < 1 {
            return Err(ConfigError::invalid(
                "max_processes",
                "at least one slot is needed for the kernel process",
            ));
        }
        if self.block_size == 0 || !self.block_size.is_power_of_two() {
            return Err(ConfigError::invalid(
                "block_size",
                "must be a non-zero power of two",
            ));
        }
        if self.block_size < STACK_ALIGNMENT {
            return Err(ConfigError::invalid(
                "block_size",
                format!("must be at least {} bytes", STACK_ALIGNMENT),
            ));
        }
        if self.stack_size < INITIAL_FRAME_SIZE {
            return Err(ConfigError::invalid(
                "stack_size",
                format!("must hold the {} byte initial frame", INITIAL_FRAME_SIZE),
            ));
        }
        if self.memory_pool < self.block_size {
            return Err(ConfigError::invalid(
                "memory_pool",
                "must hold at least one block",
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("tick_interval_ms", "must be non-zero"));
        }
        Ok(())
    }

    /// Blocks reserved for one process stack
    pub fn stack_blocks(&self) -> usize {
        blocks_for(self.stack_size, self.block_size)
    }

    /// Blocks available in the pool
    pub fn pool_blocks(&self) -> usize {
        self.memory_pool / self.block_size
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn read_env(key: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| {
                ConfigError::invalid(key, format!("'{}' is not an unsigned integer", raw))
            }),
        Err(_) => Ok(None),
    }
}
