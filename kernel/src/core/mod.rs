/*!
 * Core Module
 * Fundamental kernel types, configuration and error handling
 */

pub mod config;
pub mod data_structures;
pub mod errors;
pub mod id;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use config::KernelConfig;
pub use data_structures::InlineString;
pub use errors::*;
pub use id::PidAllocator;
pub use types::*;
