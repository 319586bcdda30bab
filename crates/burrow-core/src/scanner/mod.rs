//! Scan orchestration: one directory's immediate children, in parallel.
//!
//! [`scan_directory`] lists the immediate children of a path and fans the
//! per-child size work out to a bounded worker pool: directory children go
//! through the bounded size estimator, file children are statted directly.
//! Workers aggregate into a shared buffer under a single mutex; a separate
//! atomic counter tracks processed items so a progress UI can read it
//! concurrently without locking.
//!
//! Because directory sizes come from [`estimate::estimate_size`], entry
//! sizes (and thus `total_size`) are lower-bound approximations, not exact
//! filesystem accounting.
pub mod estimate;

use crate::config::ScanLimits;
use crate::error::ScanError;
use crate::model::{DirEntry, LargeFileEntry, ScanResult};
use crate::patterns;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;
use tracing::debug;

/// One unit of work: a single immediate child of the scan root.
struct ChildJob {
    /// Position in the original directory listing, used as the stable
    /// tie-break when sizes are equal.
    index: usize,
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Aggregation buffer shared by the worker pool.
///
/// Exclusively written by workers while the scan runs, exclusively read
/// once all workers have joined.
#[derive(Default)]
struct Aggregate {
    entries: Vec<(usize, DirEntry)>,
    large_files: Vec<(usize, LargeFileEntry)>,
    total_size: u64,
}

/// Scan the immediate children of `path`.
///
/// Fails only if the listing itself fails (unreadable root). Per-child
/// errors, such as permission denied or entries deleted mid-scan, contribute
/// zero size and are never surfaced. `processed` is incremented once per
/// completed child; readers may poll it concurrently.
pub fn scan_directory(
    path: &Path,
    limits: &ScanLimits,
    processed: &AtomicU64,
) -> Result<ScanResult, ScanError> {
    let started = Instant::now();

    let listing = fs::read_dir(path).map_err(|source| ScanError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut jobs: Vec<ChildJob> = Vec::new();
    for entry in listing.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        // System paths are excluded entirely: never counted, never descended.
        if patterns::is_skipped(&name) {
            continue;
        }
        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        jobs.push(ChildJob {
            index: jobs.len(),
            name,
            path: entry.path(),
            is_dir,
        });
    }

    let total_children = jobs.len() as u64;
    let workers = limits.worker_count().min(jobs.len().max(1));
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<ChildJob>();
    for job in jobs {
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let aggregate = Mutex::new(Aggregate::default());

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let aggregate = &aggregate;
            scope.spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    process_child(job, limits, aggregate);
                    processed.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    let Aggregate {
        mut entries,
        mut large_files,
        total_size,
    } = aggregate.into_inner();

    // Normalize both lists to discovery order first, then a stable sort by
    // size, so output is reproducible across runs given identical
    // filesystem state. Worker-completion order is not deterministic.
    entries.sort_by_key(|(index, _)| *index);
    entries.sort_by(|(_, a), (_, b)| b.size.cmp(&a.size));
    large_files.sort_by_key(|(index, _)| *index);
    large_files.sort_by(|(_, a), (_, b)| b.size.cmp(&a.size));

    debug!(
        path = %path.display(),
        children = total_children,
        total_size,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan complete"
    );

    Ok(ScanResult {
        entries: entries.into_iter().map(|(_, e)| e).collect(),
        large_files: large_files.into_iter().map(|(_, f)| f).collect(),
        total_size,
        total_files: total_children,
    })
}

fn process_child(job: ChildJob, limits: &ScanLimits, aggregate: &Mutex<Aggregate>) {
    let mut size = 0_u64;
    let mut last_access: Option<DateTime<Utc>> = None;
    let mut is_cleanable = false;

    if job.is_dir {
        size = estimate::estimate_size(&job.path, limits);
        is_cleanable = patterns::is_cleanable(&job.name);
    } else if let Ok(meta) = fs::symlink_metadata(&job.path) {
        size = meta.len();
        last_access = meta.modified().ok().map(DateTime::<Utc>::from);
    }

    let mut agg = aggregate.lock();
    agg.total_size += size;
    if !job.is_dir && size >= limits.large_file_threshold {
        agg.large_files.push((
            job.index,
            LargeFileEntry {
                name: job.name.clone(),
                path: job.path.clone(),
                size,
            },
        ));
    }
    agg.entries.push((
        job.index,
        DirEntry {
            name: job.name,
            path: job.path,
            size,
            is_dir: job.is_dir,
            last_access,
            is_cleanable,
        },
    ));
}
