//! Bounded directory-size estimation.
//!
//! [`estimate_size`] performs a shallow depth-first walk capped by recursion
//! depth, total files counted, and a wall-clock deadline. The deadline is
//! checked at **every directory-entry boundary**, not just on function
//! entry, so a single huge flat directory cannot blow the budget before the
//! first check. When any bound trips, the walk stops and returns whatever
//! it has accumulated.
//!
//! The result is therefore a **lower-bound approximation**, never an exact
//! size: bounded latency is traded for accuracy on purpose. Callers that
//! need exactness must not use this.
use crate::config::ScanLimits;
use crate::patterns;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Walk-scoped cancellation token plus accumulators.
///
/// Passed down the recursion so every level checks the same deadline and
/// file budget.
struct WalkBudget {
    deadline: Instant,
    max_depth: usize,
    max_files: u64,
    files_seen: u64,
    size: u64,
}

impl WalkBudget {
    #[inline]
    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Estimate the total size of `path` in bytes, bounded by `limits`.
///
/// Never blocks longer than `limits.size_budget` plus one directory-entry
/// read. Errors reading any subdirectory (permissions, entries deleted
/// mid-walk) contribute zero and never abort the walk or reach the caller.
pub fn estimate_size(path: &Path, limits: &ScanLimits) -> u64 {
    let mut budget = WalkBudget {
        deadline: Instant::now() + limits.size_budget,
        max_depth: limits.max_depth,
        max_files: limits.max_files,
        files_seen: 0,
        size: 0,
    };
    walk(path, 0, &mut budget);
    budget.size
}

fn walk(dir: &Path, depth: usize, budget: &mut WalkBudget) {
    if budget.expired() || depth > budget.max_depth {
        return;
    }

    // Unreadable directory: zero contribution, keep going elsewhere.
    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(_) => return,
    };

    for entry in entries {
        if budget.expired() || budget.files_seen > budget.max_files {
            return;
        }

        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            // Dot-directories are skipped everywhere except the walk root.
            if patterns::is_skipped(&name) || (name.starts_with('.') && name.len() > 1) {
                continue;
            }
            walk(&entry.path(), depth + 1, budget);
        } else if file_type.is_file() {
            if let Ok(meta) = entry.metadata() {
                budget.size += meta.len();
                budget.files_seen += 1;
            }
        }
        // Symlinks and other special files are not followed or counted.
    }
}
