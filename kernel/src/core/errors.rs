/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::data_structures::InlineString;
use crate::core::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export MemoryError from memory module
pub use crate::memory::MemoryError;

/// Process-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Process table full: all {capacity} slots are in use")]
    #[diagnostic(
        code(process::resource_exhausted),
        help("Terminate unused processes or raise KERNEL_MAX_PROCESSES.")
    )]
    ResourceExhausted { capacity: usize },

    #[error("Out of memory: could not allocate a {requested} byte stack")]
    #[diagnostic(
        code(process::out_of_memory),
        help("The block allocator is exhausted. Terminate processes to release their stacks.")
    )]
    OutOfMemory { requested: usize },

    #[error("Process {0} not found")]
    #[diagnostic(
        code(process::not_found),
        help("The process may have terminated or never existed. Check PID validity.")
    )]
    NotFound(Pid),

    #[error("Process table invariant violated: {0}")]
    #[diagnostic(
        code(process::invariant_violation),
        help("The kernel process must always exist. This is fatal; the kernel must halt.")
    )]
    InvariantViolation(InlineString),

    #[error("The kernel process cannot be terminated")]
    #[diagnostic(
        code(process::kernel_process),
        help("PID 0 is the kernel itself and is only ever descheduled.")
    )]
    KernelProcess,
}

impl ProcessError {
    /// Whether the kernel must stop instead of reporting the error
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProcessError::InvariantViolation(_))
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Review the kernel configuration parameters.")
    )]
    InvalidValue {
        key: InlineString,
        reason: InlineString,
    },

    #[error("Cannot read configuration: {0}")]
    #[diagnostic(
        code(config::unreadable),
        help("Check that KERNEL_CONFIG points at a readable JSON file.")
    )]
    Unreadable(InlineString),
}

impl ConfigError {
    pub fn invalid(key: &str, reason: impl Into<InlineString>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Memory error: {0}")]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),

    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Serializable error representation for reporting to the command layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: InlineString,
    pub message: InlineString,
}

impl SerializableError {
    pub fn new(error_type: impl Into<InlineString>, message: impl Into<InlineString>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}

impl From<ProcessError> for SerializableError {
    fn from(err: ProcessError) -> Self {
        SerializableError::new("process_error", err.to_string())
    }
}

impl From<KernelError> for SerializableError {
    fn from(err: KernelError) -> Self {
        let error_type = match &err {
            KernelError::Memory(_) => "memory_error",
            KernelError::Process(_) => "process_error",
            KernelError::Config(_) => "configuration_error",
        };
        SerializableError::new(error_type, err.to_string())
    }
}

/// Result type for kernel operations
pub type Result<T> = std::result::Result<T, KernelError>;
