//! Overview dashboard: well-known roots with rolled-up sizes.
//!
//! The overview is a synthetic directory view: one entry per well-known
//! root under the user's home, sized from the overview snapshot tier
//! rather than a live scan. A background prefetch warms missing snapshots
//! with the bounded estimator so the dashboard fills in as results arrive.
use crate::cache::CacheStore;
use crate::config::ScanLimits;
use crate::model::DirEntry;
use crate::nav::EngineEvent;
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::debug;

const HOME_ROOTS: &[&str] = &[
    "Desktop",
    "Documents",
    "Downloads",
    "Movies",
    "Music",
    "Pictures",
    "Public",
];

/// The user's home directory, from the environment.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Paths shown on the overview dashboard: the home itself plus its
/// well-known subdirectories that actually exist.
pub fn overview_roots(home: &Path) -> Vec<PathBuf> {
    let mut roots = vec![home.to_path_buf()];
    for name in HOME_ROOTS {
        let path = home.join(name);
        if path.is_dir() {
            roots.push(path);
        }
    }
    roots
}

/// Build dashboard entries for `roots`, sized from the overview snapshot
/// store (zero when no fresh snapshot exists yet).
pub fn overview_entries(roots: &[PathBuf], cache: &CacheStore) -> Vec<DirEntry> {
    let mut entries: Vec<DirEntry> = roots
        .iter()
        .map(|root| DirEntry {
            name: root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.to_string_lossy().into_owned()),
            path: root.clone(),
            size: cache.overview_size(root).unwrap_or(0),
            is_dir: true,
            last_access: None,
            is_cleanable: false,
        })
        .collect();
    entries.sort_by(|a, b| b.size.cmp(&a.size));
    entries
}

/// Warm missing overview snapshots on a background thread.
///
/// Each root without a fresh snapshot gets one bounded size estimate; every
/// stored size is also announced over `tx` so a live dashboard can update
/// in place.
pub fn spawn_prefetch(
    roots: Vec<PathBuf>,
    cache: Arc<CacheStore>,
    limits: ScanLimits,
    tx: Sender<EngineEvent>,
) {
    let spawned = thread::Builder::new()
        .name("burrow-prefetch".into())
        .spawn(move || {
            for root in roots {
                if cache.overview_size(&root).is_some() {
                    continue;
                }
                let size = crate::scanner::estimate::estimate_size(&root, &limits);
                if size > 0 {
                    cache.store_overview_size(&root, size);
                    if tx.send(EngineEvent::OverviewSized { path: root, size }).is_err() {
                        // Engine gone; stop warming.
                        return;
                    }
                }
            }
            debug!("overview prefetch complete");
        });
    if let Err(err) = spawned {
        debug!(%err, "failed to spawn overview prefetch thread");
    }
}
