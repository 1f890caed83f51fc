/*!
 * ID Generation
 * Monotonic process id assignment with wraparound handling
 */

use super::limits::KERNEL_PID;
use super::types::Pid;

/// Monotonic PID counter
///
/// Ids increase by one per process. When the counter wraps it skips the
/// reserved kernel id and any id still held by a live process, so a long
/// running system never hands out a duplicate.
#[derive(Debug, Clone)]
pub struct PidAllocator {
    next: Pid,
}

impl PidAllocator {
    /// Counter whose first id is 1
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Counter starting at `start` (0 is bumped to 1)
    pub const fn starting_at(start: Pid) -> Self {
        Self {
            next: if start == KERNEL_PID { 1 } else { start },
        }
    }

    /// Hand out the next id for which `is_live` returns false
    ///
    /// Gives up after `max_attempts` candidates; callers pass the number of
    /// live processes plus one, which always suffices.
    pub fn allocate(&mut self, max_attempts: usize, is_live: impl Fn(Pid) -> bool) -> Option<Pid> {
        for _ in 0..max_attempts {
            let candidate = self.bump();
            if !is_live(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Id the next call to `allocate` will try first
    pub fn peek(&self) -> Pid {
        self.next
    }

    fn bump(&mut self) -> Pid {
        let candidate = self.next;
        self.next = match self.next.wrapping_add(1) {
            KERNEL_PID => 1,
            n => n,
        };
        candidate
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
