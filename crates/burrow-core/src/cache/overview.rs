//! Overview snapshot store: coarse per-path size aggregates.
//!
//! Much cheaper than a full scan record: just `{size, updated}` per path,
//! held in one in-memory map and mirrored to a single JSON document. Used
//! for the overview dashboard and background prefetch of many roots, where
//! a full per-path cache file each would be wasteful.
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    size: u64,
    updated: DateTime<Utc>,
}

struct State {
    loaded: bool,
    map: HashMap<PathBuf, Snapshot>,
}

/// In-memory map of rolled-up sizes, lazily loaded from and mirrored to a
/// JSON document. All access goes through this handle; nothing else touches
/// the document.
pub struct OverviewStore {
    doc_path: PathBuf,
    ttl: Duration,
    state: Mutex<State>,
}

impl OverviewStore {
    pub fn new(doc_path: PathBuf, ttl: Duration) -> Self {
        Self {
            doc_path,
            ttl,
            state: Mutex::new(State {
                loaded: false,
                map: HashMap::new(),
            }),
        }
    }

    /// Current snapshot size for `path`, if present and fresh.
    pub fn get(&self, path: &Path) -> Option<u64> {
        let mut state = self.state.lock();
        self.ensure_loaded(&mut state);
        let snapshot = state.map.get(path)?;
        if snapshot.size == 0 {
            return None;
        }
        let age = (Utc::now() - snapshot.updated).to_std().ok()?;
        if age > self.ttl {
            return None;
        }
        Some(snapshot.size)
    }

    /// Record `size` for `path` and mirror the map to disk.
    ///
    /// Zero sizes are not stored; an empty estimate is indistinguishable
    /// from a failed one.
    pub fn put(&self, path: &Path, size: u64) {
        if size == 0 {
            return;
        }
        let mut state = self.state.lock();
        self.ensure_loaded(&mut state);
        state.map.insert(
            path.to_path_buf(),
            Snapshot {
                size,
                updated: Utc::now(),
            },
        );
        self.persist(&state.map);
    }

    /// Drop the snapshot for `path`, if any, and mirror the map to disk.
    pub fn remove(&self, path: &Path) {
        let mut state = self.state.lock();
        self.ensure_loaded(&mut state);
        if state.map.remove(path).is_some() {
            self.persist(&state.map);
        }
    }

    fn ensure_loaded(&self, state: &mut State) {
        if state.loaded {
            return;
        }
        state.map = self.load_document();
        state.loaded = true;
    }

    /// Read the JSON document. Absent or empty means an empty map; a
    /// document that fails to decode is renamed aside with a `.corrupt`
    /// suffix and treated as empty, never fatal to the caller.
    fn load_document(&self) -> HashMap<PathBuf, Snapshot> {
        let bytes = match fs::read(&self.doc_path) {
            Ok(b) => b,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(doc = %self.doc_path.display(), %err, "overview document unreadable");
                }
                return HashMap::new();
            }
        };
        if bytes.is_empty() {
            return HashMap::new();
        }
        match serde_json::from_slice(&bytes) {
            Ok(map) => map,
            Err(err) => {
                warn!(doc = %self.doc_path.display(), %err, "overview document corrupt, quarantining");
                let _ = fs::rename(&self.doc_path, self.doc_path.with_extension("json.corrupt"));
                HashMap::new()
            }
        }
    }

    /// Mirror the map atomically: write a temp file, then rename over the
    /// document so a crash can never leave it truncated.
    fn persist(&self, map: &HashMap<PathBuf, Snapshot>) {
        let result = serde_json::to_vec_pretty(map)
            .map_err(io::Error::other)
            .and_then(|bytes| {
                let tmp = self.doc_path.with_extension("json.tmp");
                fs::write(&tmp, bytes)?;
                fs::rename(&tmp, &self.doc_path)
            });
        if let Err(err) = result {
            warn!(doc = %self.doc_path.display(), %err, "failed to persist overview document");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &Path, ttl: Duration) -> OverviewStore {
        OverviewStore::new(dir.join("overview.json"), ttl)
    }

    #[test]
    fn put_then_get_roundtrips() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(tmp.path(), Duration::from_secs(3600));
        store.put(Path::new("/some/dir"), 42_000);
        assert_eq!(store.get(Path::new("/some/dir")), Some(42_000));
        assert_eq!(store.get(Path::new("/other")), None);
    }

    #[test]
    fn survives_reload_from_document() {
        let tmp = TempDir::new().unwrap();
        store_in(tmp.path(), Duration::from_secs(3600)).put(Path::new("/a"), 7);
        // A fresh store reads the mirrored document.
        let reloaded = store_in(tmp.path(), Duration::from_secs(3600));
        assert_eq!(reloaded.get(Path::new("/a")), Some(7));
    }

    #[test]
    fn expired_snapshot_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("overview.json");
        let mut map = HashMap::new();
        map.insert(
            PathBuf::from("/old"),
            Snapshot {
                size: 99,
                updated: Utc::now() - chrono::Duration::hours(48),
            },
        );
        fs::write(&doc, serde_json::to_vec(&map).unwrap()).unwrap();

        let store = OverviewStore::new(doc, Duration::from_secs(3600));
        assert_eq!(store.get(Path::new("/old")), None);
    }

    #[test]
    fn zero_sizes_are_not_stored() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(tmp.path(), Duration::from_secs(3600));
        store.put(Path::new("/empty"), 0);
        assert_eq!(store.get(Path::new("/empty")), None);
    }

    #[test]
    fn corrupt_document_is_quarantined_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("overview.json");
        fs::write(&doc, b"{not json").unwrap();

        let store = OverviewStore::new(doc.clone(), Duration::from_secs(3600));
        assert_eq!(store.get(Path::new("/x")), None);
        assert!(tmp.path().join("overview.json.corrupt").exists());

        // The store works normally from then on.
        store.put(Path::new("/x"), 5);
        assert_eq!(store.get(Path::new("/x")), Some(5));
    }

    #[test]
    fn remove_persists_the_deletion() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(tmp.path(), Duration::from_secs(3600));
        store.put(Path::new("/a"), 1);
        store.remove(Path::new("/a"));
        let reloaded = store_in(tmp.path(), Duration::from_secs(3600));
        assert_eq!(reloaded.get(Path::new("/a")), None);
    }
}
