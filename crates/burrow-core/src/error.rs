//! Error taxonomy for the core.
//!
//! Only two error kinds are ever surfaced to the user: a failed directory
//! listing ([`ScanError`]) and a failed delete ([`DeleteError`]). Everything
//! else (unreadable children during estimation, corrupt cache files, cache
//! expiry) is absorbed by the component that detects it.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The root of a scan could not be listed. Fatal to that scan attempt,
/// recoverable via retry/refresh.
#[derive(Debug, Error)]
#[error("failed to list {path}: {source}")]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A delete request failed. Surfaced as a message; no rescan is triggered.
#[derive(Debug, Error)]
#[error("failed to delete {path}: {source}")]
pub struct DeleteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Why a cache lookup returned no usable record.
///
/// None of these are fatal to the caller: every variant is a normal miss
/// that triggers a fresh scan.
#[derive(Debug, Error)]
pub enum CacheMiss {
    /// No record exists for the path.
    #[error("no cache record")]
    Absent,
    /// The record file could not be decoded. The file has been renamed
    /// aside with a `.corrupt` suffix.
    #[error("cache record corrupt")]
    Corrupt,
    /// The record exceeded the absolute TTL, regardless of mtime.
    #[error("cache expired: too old")]
    TooOld,
    /// The directory was modified after the scan, beyond the grace and
    /// reuse windows.
    #[error("cache expired: directory modified")]
    DirModified,
    /// A stale-read record exceeded the short stale TTL.
    #[error("stale cache expired")]
    StaleExpired,
    /// The cache file or the target directory could not be read.
    #[error("cache i/o: {0}")]
    Io(#[from] io::Error),
}
