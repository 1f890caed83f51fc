/*!
 * Round-Robin Scheduler
 *
 * Picks the next process to run by scanning the registry's slot table
 * forward from the current slot, wrapping once. Priority is not consulted:
 * every ready process gets its turn in slot order.
 */

use super::pcb::ProcessControlBlock;
use super::types::ProcessState;

/// Round-robin slot selection
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl RoundRobin {
    /// First `Ready` slot after `from`, wrapping through the table once
    ///
    /// `from` itself is not a candidate. Returns `None` when no other slot
    /// holds a ready process.
    pub fn select(&self, slots: &[ProcessControlBlock], from: usize) -> Option<usize> {
        let n = slots.len();
        (1..n)
            .map(|offset| (from + offset) % n)
            .find(|&idx| slots[idx].state == ProcessState::Ready)
    }
}
