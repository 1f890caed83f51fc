/*!
 * Memory Module
 * Block allocation for process stacks
 */

pub mod manager;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use manager::BlockManager;
pub use traits::*;
pub use types::*;
