//! Tunable limits and cache policy.
//!
//! Every bound the scanner and cache enforce lives here rather than being
//! hard-coded at the use site, so frontends and tests can tighten or relax
//! them. The defaults are the values the tool ships with; none of them are
//! authoritative beyond that.
use std::path::PathBuf;
use std::time::Duration;

/// Bounds applied to directory-size estimation and scanning.
#[derive(Debug, Clone)]
pub struct ScanLimits {
    /// Wall-clock budget for estimating one subdirectory's size. The
    /// estimate stops and returns whatever it has accumulated when the
    /// budget runs out.
    pub size_budget: Duration,
    /// Maximum recursion depth of the shallow size walk.
    pub max_depth: usize,
    /// Maximum number of files counted across one whole size walk.
    pub max_files: u64,
    /// Files at or above this size are reported as large files.
    pub large_file_threshold: u64,
    /// Hard cap on the scan worker pool, applied after `2 × num_cpus`.
    pub max_workers: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            size_budget: Duration::from_millis(500),
            max_depth: 3,
            max_files: 10_000,
            large_file_threshold: 100 * 1024 * 1024,
            max_workers: 32,
        }
    }
}

impl ScanLimits {
    /// Worker-pool capacity: `min(2 × available parallelism, max_workers)`.
    ///
    /// Doubled because the work is I/O bound; capped to avoid descriptor and
    /// thread exhaustion on directories with thousands of children.
    pub fn worker_count(&self) -> usize {
        (num_cpus::get() * 2).clamp(1, self.max_workers)
    }
}

/// Staleness policy for the persistent cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Absolute ceiling on full-record age. Enforced unconditionally,
    /// regardless of whether the directory's mtime still matches.
    pub strict_ttl: Duration,
    /// Ceiling on record age for the stale-read path, which skips the
    /// mtime check entirely. Must be shorter than `strict_ttl`.
    pub stale_ttl: Duration,
    /// Ceiling on overview-snapshot age.
    pub overview_ttl: Duration,
    /// A cached record stays valid if the directory's mtime advanced by no
    /// more than this. Absorbs filesystem mtime jitter.
    pub mtime_grace: Duration,
    /// A record younger than this is reused even past the grace window, so
    /// frequently-touched directories don't force a rescan on every visit.
    pub reuse_window: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            strict_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            stale_ttl: Duration::from_secs(24 * 60 * 60),
            overview_ttl: Duration::from_secs(24 * 60 * 60),
            mtime_grace: Duration::from_secs(2),
            reuse_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Top-level configuration handed to the engine and frontends.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub limits: ScanLimits,
    pub policy: CachePolicy,
    /// Overrides the default cache directory (`~/.cache/burrow`).
    pub cache_dir: Option<PathBuf>,
}
