/*!
 * Free Run List
 * Address-ordered runs of free blocks with splitting and coalescing
 */

use std::collections::BTreeMap;

/// Run of contiguous free blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct FreeRun {
    pub start: usize,
    pub len: usize,
}

impl FreeRun {
    #[inline]
    fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Free runs keyed by first block index
///
/// - First-fit allocation in address order: O(n) in the number of runs
/// - Insertion merges with both neighbours: O(log n)
#[derive(Debug)]
pub(super) struct FreeRunList {
    runs: BTreeMap<usize, usize>,
}

impl FreeRunList {
    /// List holding a single run covering `total_blocks`
    pub fn new(total_blocks: usize) -> Self {
        let mut runs = BTreeMap::new();
        if total_blocks > 0 {
            runs.insert(0, total_blocks);
        }
        Self { runs }
    }

    /// Take `count` blocks from the lowest-addressed run that fits
    pub fn take_first_fit(&mut self, count: usize) -> Option<usize> {
        let run = self
            .runs
            .iter()
            .map(|(&start, &len)| FreeRun { start, len })
            .find(|run| run.len >= count)?;

        self.runs.remove(&run.start);
        if run.len > count {
            // Keep the remainder above the allocation
            self.runs.insert(run.start + count, run.len - count);
        }
        Some(run.start)
    }

    /// Return a run, merging it with adjacent free runs
    pub fn insert(&mut self, run: FreeRun) {
        let mut merged = run;

        if let Some((&prev_start, &prev_len)) = self.runs.range(..run.start).next_back() {
            if prev_start + prev_len == merged.start {
                self.runs.remove(&prev_start);
                merged = FreeRun {
                    start: prev_start,
                    len: prev_len + merged.len,
                };
            }
        }

        if let Some(&next_len) = self.runs.get(&merged.end()) {
            self.runs.remove(&merged.end());
            merged.len += next_len;
        }

        self.runs.insert(merged.start, merged.len);
    }

    /// Whether any block of `run` is already free
    pub fn overlaps(&self, run: FreeRun) -> bool {
        if let Some((&start, &len)) = self.runs.range(..run.end()).next_back() {
            return start + len > run.start;
        }
        false
    }

    /// Number of runs (fragmentation indicator)
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Total free blocks
    pub fn free_blocks(&self) -> usize {
        self.runs.values().sum()
    }

    /// Longest contiguous run
    pub fn largest_run(&self) -> usize {
        self.runs.values().copied().max().unwrap_or(0)
    }
}
