/*!
 * Execution Context
 *
 * Saved register state of a process and the stack it owns.
 *
 * A process that has never run gets a synthesized context: the entry point
 * is written at the top of its fresh stack (stacks grow downward), a zeroed
 * register snapshot is laid out below it, and the address of that snapshot
 * becomes the saved stack pointer. Restoring such a context pops the zeroed
 * registers and returns into the entry point.
 */

use super::types::EntryPoint;
use crate::core::limits::{INITIAL_FRAME_SIZE, SAVED_GPR_COUNT, STACK_ALIGNMENT};
use crate::core::types::{Address, Size};
use crate::memory::Region;
use serde::{Deserialize, Serialize};
use std::mem::size_of;

/// Interrupt-enable flag plus the always-set reserved bit
pub const DEFAULT_RFLAGS: u64 = 0x202;

const WORD: usize = size_of::<u64>();

/// Saved CPU register set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct ExecutionContext {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    /// Instruction pointer
    pub rip: u64,
    /// Stack pointer
    pub rsp: u64,
    pub rflags: u64,
}

impl ExecutionContext {
    /// Context of a process that has never run
    pub fn initial(entry: EntryPoint, stack_pointer: Address) -> Self {
        Self {
            rip: entry.address() as u64,
            rsp: stack_pointer as u64,
            rflags: DEFAULT_RFLAGS,
            ..Self::default()
        }
    }

    #[inline]
    pub fn stack_pointer(&self) -> Address {
        self.rsp as Address
    }

    #[inline]
    pub fn instruction_pointer(&self) -> Address {
        self.rip as Address
    }

    /// General-purpose registers in save order
    pub fn general_purpose(&self) -> [u64; SAVED_GPR_COUNT] {
        [
            self.rax, self.rbx, self.rcx, self.rdx, self.rsi, self.rdi, self.rbp, self.r8,
            self.r9, self.r10, self.r11, self.r12, self.r13, self.r14, self.r15,
        ]
    }
}

/// Stack owned by a process
///
/// Holds the allocator region together with the words written at its top
/// when the process was created. Not `Clone`: exactly one PCB owns a stack
/// and it is handed back to the allocator exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct Stack {
    region: Region,
    blocks: usize,
    /// Initial frame, lowest address first; starts at `region.top() - INITIAL_FRAME_SIZE`
    frame: Box<[u64]>,
}

impl Stack {
    /// Take ownership of `region` and lay out the initial frame for `entry`
    ///
    /// Returns the stack and the context that resumes into `entry`, or `None`
    /// if the region cannot hold an aligned initial frame.
    pub fn with_initial_frame(
        region: Region,
        blocks: usize,
        entry: EntryPoint,
    ) -> Option<(Self, ExecutionContext)> {
        let top = region.top() & !(STACK_ALIGNMENT - 1);
        let stack_pointer = top.checked_sub(INITIAL_FRAME_SIZE)?;
        if stack_pointer < region.base {
            return None;
        }

        // Zeroed registers below, entry point in the highest word
        let mut frame = vec![0u64; INITIAL_FRAME_SIZE / WORD].into_boxed_slice();
        if let Some(ret) = frame.last_mut() {
            *ret = entry.address() as u64;
        }

        let stack = Self {
            region,
            blocks,
            frame,
        };
        Some((stack, ExecutionContext::initial(entry, stack_pointer)))
    }

    #[inline]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Blocks to hand back to the allocator
    #[inline]
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    #[inline]
    pub fn base(&self) -> Address {
        self.region.base
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.region.size
    }

    #[inline]
    pub fn top(&self) -> Address {
        self.region.top() & !(STACK_ALIGNMENT - 1)
    }

    /// Lowest address of the initial frame
    #[inline]
    pub fn frame_base(&self) -> Address {
        self.top() - INITIAL_FRAME_SIZE
    }

    /// Read a word written into the initial frame
    pub fn read_word(&self, address: Address) -> Option<u64> {
        let offset = address.checked_sub(self.frame_base())?;
        if offset % WORD != 0 {
            return None;
        }
        self.frame.get(offset / WORD).copied()
    }

    /// Give the region back for release
    pub fn into_region(self) -> (Region, usize) {
        (self.region, self.blocks)
    }
}
