//! Persistent scan cache, two independent tiers.
//!
//! **Full records**: one bincode file per scanned path under the cache
//! directory, named by a stable XxHash64 of the absolute path, holding the
//! complete [`ScanResult`] plus the directory mtime and scan time. Strict
//! reads enforce a 7-day TTL and an mtime check softened by the grace and
//! reuse windows; stale reads skip the mtime check and enforce only a short
//! TTL, for painting the UI immediately while a checked rescan runs.
//!
//! **Overview snapshots**: a single JSON document of rolled-up sizes, see
//! [`overview`].
//!
//! Both tiers are user-local; deleting the cache directory is simply a full
//! cache flush. Nothing outside this module touches the files.
pub mod overview;

use crate::config::CachePolicy;
use crate::error::CacheMiss;
use crate::model::ScanResult;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use twox_hash::XxHash64;

const OVERVIEW_DOC: &str = "overview.json";

/// A full scan record as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub result: ScanResult,
    /// The directory's mtime at the moment it was scanned.
    pub dir_mtime: DateTime<Utc>,
    pub scanned_at: DateTime<Utc>,
}

/// Handle to the on-disk cache. Callers receive this by injection; there is
/// no ambient global state.
pub struct CacheStore {
    dir: PathBuf,
    policy: CachePolicy,
    overview: overview::OverviewStore,
}

impl CacheStore {
    /// Open (creating if needed) the cache at `dir`, or at the default
    /// user-local location when `dir` is `None`.
    pub fn open(dir: Option<PathBuf>, policy: CachePolicy) -> io::Result<Self> {
        let dir = match dir {
            Some(d) => d,
            None => default_cache_dir().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "cannot resolve home directory")
            })?,
        };
        fs::create_dir_all(&dir)?;
        let overview = overview::OverviewStore::new(dir.join(OVERVIEW_DOC), policy.overview_ttl);
        Ok(Self {
            dir,
            policy,
            overview,
        })
    }

    /// Strict read: fails on absence, corruption, or expiry.
    ///
    /// Expiry is checked in order: the absolute TTL first (unconditional,
    /// regardless of mtime), then the mtime comparison softened by the
    /// grace window and, for young records, the reuse window.
    pub fn load(&self, path: &Path) -> Result<CacheRecord, CacheMiss> {
        let record = self.load_raw(path)?;
        let meta = fs::metadata(path)?;

        let age = Utc::now() - record.scanned_at;
        if exceeds(age, self.policy.strict_ttl) {
            return Err(CacheMiss::TooOld);
        }

        let dir_mtime = meta.modified().map(DateTime::<Utc>::from)?;
        if dir_mtime > record.dir_mtime {
            let excess = dir_mtime - record.dir_mtime;
            // Directory mtimes are noisy; a small advance is forgiven, and a
            // recent record is reused even past the grace window so
            // frequently-touched directories still refresh eventually.
            if exceeds(excess, self.policy.mtime_grace)
                && exceeds(age, self.policy.reuse_window)
            {
                return Err(CacheMiss::DirModified);
            }
        }

        Ok(record)
    }

    /// Stale read: skips the mtime check entirely, enforcing only the short
    /// stale TTL.
    ///
    /// For immediate display while a correctness-checked rescan runs in the
    /// background. Never authoritative for anything but painting.
    pub fn load_stale(&self, path: &Path) -> Result<CacheRecord, CacheMiss> {
        let record = self.load_raw(path)?;
        fs::metadata(path)?;
        let age = Utc::now() - record.scanned_at;
        if exceeds(age, self.policy.stale_ttl) {
            return Err(CacheMiss::StaleExpired);
        }
        Ok(record)
    }

    /// Write a fresh record for `path`, overwriting any prior one.
    pub fn save(&self, path: &Path, result: &ScanResult) -> io::Result<()> {
        let meta = fs::metadata(path)?;
        let dir_mtime = meta.modified().map(DateTime::<Utc>::from)?;
        let record = CacheRecord {
            result: result.clone(),
            dir_mtime,
            scanned_at: Utc::now(),
        };
        self.write_record(path, &record)
    }

    /// Cached total file count for `path`, ignoring expiry.
    ///
    /// Used to seed the scan-progress total before the real scan reports in.
    pub fn peek_total_files(&self, path: &Path) -> Option<u64> {
        self.load_raw(path).ok().map(|r| r.result.total_files)
    }

    /// Purge both tiers for `path`: its full record and its overview
    /// snapshot. The next navigation into it will rescan.
    pub fn invalidate(&self, path: &Path) {
        let _ = fs::remove_file(self.record_path(path));
        self.overview.remove(path);
        debug!(path = %path.display(), "cache invalidated");
    }

    /// Rolled-up size for `path` from the overview tier.
    pub fn overview_size(&self, path: &Path) -> Option<u64> {
        self.overview.get(path)
    }

    /// Store a rolled-up size for `path` in the overview tier.
    pub fn store_overview_size(&self, path: &Path, size: u64) {
        self.overview.put(path, size);
    }

    /// Decode the record file without any freshness checks.
    ///
    /// A file that fails to decode is renamed aside with a `.corrupt`
    /// suffix and reported as [`CacheMiss::Corrupt`]; the store stays
    /// usable and the bad file is kept for inspection.
    fn load_raw(&self, path: &Path) -> Result<CacheRecord, CacheMiss> {
        let file_path = self.record_path(path);
        let bytes = match fs::read(&file_path) {
            Ok(b) => b,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(CacheMiss::Absent),
            Err(err) => return Err(CacheMiss::Io(err)),
        };
        match bincode::deserialize(&bytes) {
            Ok(record) => Ok(record),
            Err(err) => {
                debug!(file = %file_path.display(), %err, "cache record corrupt, quarantining");
                let _ = fs::rename(&file_path, file_path.with_extension("corrupt"));
                Err(CacheMiss::Corrupt)
            }
        }
    }

    fn write_record(&self, path: &Path, record: &CacheRecord) -> io::Result<()> {
        let bytes = bincode::serialize(record).map_err(io::Error::other)?;
        let file_path = self.record_path(path);
        let tmp = file_path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &file_path)
    }

    /// Stable on-disk name for a path's record: XxHash64 of the absolute
    /// path, hex-encoded.
    fn record_path(&self, path: &Path) -> PathBuf {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(path.to_string_lossy().as_bytes());
        self.dir.join(format!("{:016x}.cache", hasher.finish()))
    }
}

/// Whether a chrono delta exceeds a std duration. Negative deltas (clock
/// skew) never exceed anything.
fn exceeds(delta: TimeDelta, limit: Duration) -> bool {
    delta.to_std().map(|d| d > limit).unwrap_or(false)
}

/// `~/.cache/burrow` (or the platform equivalent of the home directory).
pub fn default_cache_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    Some(PathBuf::from(home).join(".cache").join("burrow"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DirEntry, ScanResult};
    use tempfile::TempDir;

    fn sample_result() -> ScanResult {
        ScanResult {
            entries: vec![DirEntry {
                name: "child".into(),
                path: PathBuf::from("/scan/child"),
                size: 1234,
                is_dir: false,
                last_access: None,
                is_cleanable: false,
            }],
            large_files: Vec::new(),
            total_size: 1234,
            total_files: 1,
        }
    }

    fn store_with(policy: CachePolicy) -> (TempDir, TempDir, CacheStore) {
        let cache_dir = TempDir::new().unwrap();
        let scan_dir = TempDir::new().unwrap();
        let store = CacheStore::open(Some(cache_dir.path().to_path_buf()), policy).unwrap();
        (cache_dir, scan_dir, store)
    }

    #[test]
    fn save_then_load_roundtrips() {
        let (_c, scan, store) = store_with(CachePolicy::default());
        let result = sample_result();
        store.save(scan.path(), &result).unwrap();
        let record = store.load(scan.path()).unwrap();
        assert_eq!(record.result, result);
    }

    #[test]
    fn absent_record_is_a_miss() {
        let (_c, scan, store) = store_with(CachePolicy::default());
        assert!(matches!(store.load(scan.path()), Err(CacheMiss::Absent)));
    }

    #[test]
    fn eight_day_old_record_expires_regardless_of_mtime() {
        let (_c, scan, store) = store_with(CachePolicy::default());
        let meta = fs::metadata(scan.path()).unwrap();
        let record = CacheRecord {
            result: sample_result(),
            // mtime matches exactly; must still expire on the absolute TTL.
            dir_mtime: DateTime::<Utc>::from(meta.modified().unwrap()),
            scanned_at: Utc::now() - chrono::Duration::days(8),
        };
        store.write_record(scan.path(), &record).unwrap();
        assert!(matches!(store.load(scan.path()), Err(CacheMiss::TooOld)));
    }

    #[test]
    fn modified_directory_rejected_past_grace_and_reuse() {
        let policy = CachePolicy {
            mtime_grace: Duration::from_secs(2),
            reuse_window: Duration::from_secs(3600),
            ..CachePolicy::default()
        };
        let (_c, scan, store) = store_with(policy);
        let meta = fs::metadata(scan.path()).unwrap();
        let mtime = DateTime::<Utc>::from(meta.modified().unwrap());
        let record = CacheRecord {
            result: sample_result(),
            // The directory's real mtime is 10 minutes past what we recorded,
            // and the record is older than the reuse window.
            dir_mtime: mtime - chrono::Duration::minutes(10),
            scanned_at: Utc::now() - chrono::Duration::hours(2),
        };
        store.write_record(scan.path(), &record).unwrap();
        assert!(matches!(
            store.load(scan.path()),
            Err(CacheMiss::DirModified)
        ));
    }

    #[test]
    fn young_record_reused_despite_mtime_advance() {
        let policy = CachePolicy {
            mtime_grace: Duration::from_secs(2),
            reuse_window: Duration::from_secs(3600),
            ..CachePolicy::default()
        };
        let (_c, scan, store) = store_with(policy);
        let meta = fs::metadata(scan.path()).unwrap();
        let mtime = DateTime::<Utc>::from(meta.modified().unwrap());
        let record = CacheRecord {
            result: sample_result(),
            dir_mtime: mtime - chrono::Duration::minutes(10),
            // Well within the reuse window.
            scanned_at: Utc::now() - chrono::Duration::minutes(5),
        };
        store.write_record(scan.path(), &record).unwrap();
        assert!(store.load(scan.path()).is_ok());
    }

    #[test]
    fn small_mtime_jitter_forgiven_by_grace() {
        let policy = CachePolicy {
            mtime_grace: Duration::from_secs(30),
            reuse_window: Duration::ZERO,
            ..CachePolicy::default()
        };
        let (_c, scan, store) = store_with(policy);
        let meta = fs::metadata(scan.path()).unwrap();
        let mtime = DateTime::<Utc>::from(meta.modified().unwrap());
        let record = CacheRecord {
            result: sample_result(),
            dir_mtime: mtime - chrono::Duration::seconds(5),
            scanned_at: Utc::now() - chrono::Duration::hours(2),
        };
        store.write_record(scan.path(), &record).unwrap();
        assert!(store.load(scan.path()).is_ok());
    }

    #[test]
    fn stale_read_skips_mtime_but_enforces_short_ttl() {
        let policy = CachePolicy {
            stale_ttl: Duration::from_secs(3600),
            ..CachePolicy::default()
        };
        let (_c, scan, store) = store_with(policy);
        let meta = fs::metadata(scan.path()).unwrap();
        let mtime = DateTime::<Utc>::from(meta.modified().unwrap());

        // mtime wildly out of date: stale read does not care.
        let fresh = CacheRecord {
            result: sample_result(),
            dir_mtime: mtime - chrono::Duration::days(30),
            scanned_at: Utc::now() - chrono::Duration::minutes(10),
        };
        store.write_record(scan.path(), &fresh).unwrap();
        assert!(store.load_stale(scan.path()).is_ok());

        // But an old record fails the stale TTL.
        let old = CacheRecord {
            scanned_at: Utc::now() - chrono::Duration::hours(2),
            ..fresh
        };
        store.write_record(scan.path(), &old).unwrap();
        assert!(matches!(
            store.load_stale(scan.path()),
            Err(CacheMiss::StaleExpired)
        ));
    }

    #[test]
    fn corrupt_record_is_quarantined_then_overwritable() {
        let (_c, scan, store) = store_with(CachePolicy::default());
        let file = store.record_path(scan.path());
        fs::write(&file, b"definitely not bincode").unwrap();

        assert!(matches!(store.load(scan.path()), Err(CacheMiss::Corrupt)));
        assert!(file.with_extension("corrupt").exists());

        // A fresh scan succeeds and replaces the quarantined file.
        store.save(scan.path(), &sample_result()).unwrap();
        assert!(store.load(scan.path()).is_ok());
    }

    #[test]
    fn invalidate_purges_record_and_overview() {
        let (_c, scan, store) = store_with(CachePolicy::default());
        store.save(scan.path(), &sample_result()).unwrap();
        store.store_overview_size(scan.path(), 1234);

        store.invalidate(scan.path());
        assert!(matches!(store.load(scan.path()), Err(CacheMiss::Absent)));
        assert_eq!(store.overview_size(scan.path()), None);
    }

    #[test]
    fn peek_total_files_ignores_expiry() {
        let (_c, scan, store) = store_with(CachePolicy::default());
        let meta = fs::metadata(scan.path()).unwrap();
        let record = CacheRecord {
            result: sample_result(),
            dir_mtime: DateTime::<Utc>::from(meta.modified().unwrap()),
            scanned_at: Utc::now() - chrono::Duration::days(30),
        };
        store.write_record(scan.path(), &record).unwrap();
        assert_eq!(store.peek_total_files(scan.path()), Some(1));
    }
}
