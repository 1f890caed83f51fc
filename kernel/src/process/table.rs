/*!
 * Process Table
 * `ps`-style rendering of registry snapshots
 */

use super::types::ProcessSnapshot;
use serde::Serialize;
use std::fmt;

/// Snapshot list with a tabular `Display`
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProcessTable {
    rows: Vec<ProcessSnapshot>,
}

impl ProcessTable {
    pub fn new(rows: Vec<ProcessSnapshot>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ProcessSnapshot] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// JSON array of the snapshots
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rows)
    }
}

impl fmt::Display for ProcessTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>5} {:>5} {:<10} {:<6} {:>6} {:>18} NAME",
            "PID", "PPID", "STATE", "PRIO", "DISP", "STACK"
        )?;
        for row in &self.rows {
            let stack = match row.stack {
                Some(region) => format!("{:#x}", region.base),
                None => "-".to_string(),
            };
            writeln!(
                f,
                "{:>5} {:>5} {:<10} {:<6} {:>6} {:>18} {}",
                row.pid,
                row.parent_pid,
                row.state.to_string(),
                row.priority.to_string(),
                row.dispatch_count,
                stack,
                row.name
            )?;
        }
        Ok(())
    }
}

impl From<Vec<ProcessSnapshot>> for ProcessTable {
    fn from(rows: Vec<ProcessSnapshot>) -> Self {
        Self::new(rows)
    }
}
