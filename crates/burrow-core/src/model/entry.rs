//! Core scan data model.
//!
//! A scan of one directory produces an immutable [`ScanResult`]: the
//! immediate children sorted by size, plus an independent list of large
//! files discovered in the same pass. Stale results are discarded and
//! replaced wholesale, never patched in place.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One immediate child of a scanned directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    /// File or directory name only.
    pub name: String,
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes. For directories this is a bounded shallow estimate,
    /// a lower bound rather than an exact figure.
    pub size: u64,
    pub is_dir: bool,
    /// Last-modified time for files; `None` for directories.
    pub last_access: Option<DateTime<Utc>>,
    /// The name matches the fixed cleanable allowlist (build output,
    /// dependency caches). Directories only.
    pub is_cleanable: bool,
}

/// A non-directory child at or above the large-file threshold.
///
/// An independent list from [`DirEntry`], not a subset view; both are
/// emitted by the same scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeFileEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// The complete outcome of scanning one directory.
///
/// Invariant: `total_size` equals the sum of `entries[].size`, and both
/// `entries` and `large_files` are sorted size-descending (stable, ties
/// keep discovery order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub entries: Vec<DirEntry>,
    pub large_files: Vec<LargeFileEntry>,
    pub total_size: u64,
    /// Number of immediate children aggregated into `entries`.
    pub total_files: u64,
}

/// A saved view of a previously visited directory.
///
/// Pushed on descend, popped on ascend; restoring a frame brings back the
/// exact view (entries, selection index, and both scroll offsets) without
/// touching the filesystem. Session-local, unlike the on-disk cache.
#[derive(Debug, Clone)]
pub struct HistoryFrame {
    pub path: PathBuf,
    pub entries: Vec<DirEntry>,
    pub large_files: Vec<LargeFileEntry>,
    pub total_size: u64,
    pub total_files: u64,
    pub selected: usize,
    pub entry_offset: usize,
    pub large_offset: usize,
    /// The frame is the overview dashboard, not a real directory listing.
    pub is_overview: bool,
}
