//! End-to-end scan orchestrator tests.
//!
//! These exercise the real worker pool against a real temporary
//! filesystem: listing, fan-out, estimation, aggregation, and the final
//! sort. The large-file threshold is lowered so the tests don't need to
//! write hundreds of megabytes.
use burrow_core::config::ScanLimits;
use burrow_core::scanner::scan_directory;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn small_threshold() -> ScanLimits {
    ScanLimits {
        large_file_threshold: 1_000,
        ..ScanLimits::default()
    }
}

/// Three children of 20 KB, 10 KB, 5 KB: total is their sum and entries
/// come back strictly size-descending.
#[test]
fn totals_and_ordering() {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join("mid.bin"), 10_000);
    write_bytes(&tmp.path().join("big.bin"), 20_000);
    write_bytes(&tmp.path().join("small.bin"), 5_000);

    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &ScanLimits::default(), &processed).unwrap();

    assert_eq!(result.total_size, 35_000);
    assert_eq!(result.total_files, 3);
    let sizes: Vec<u64> = result.entries.iter().map(|e| e.size).collect();
    assert_eq!(sizes, vec![20_000, 10_000, 5_000]);
    assert_eq!(result.entries[0].name, "big.bin");
    assert_eq!(processed.load(Ordering::Relaxed), 3);
}

/// The invariant `total_size == Σ entries.size` holds with a mix of files
/// and directories.
#[test]
fn total_matches_entry_sum() {
    let tmp = TempDir::new().unwrap();
    let sub = tmp.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_bytes(&sub.join("inner.bin"), 4_096);
    write_bytes(&tmp.path().join("top.bin"), 1_024);

    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &ScanLimits::default(), &processed).unwrap();

    let sum: u64 = result.entries.iter().map(|e| e.size).sum();
    assert_eq!(result.total_size, sum);
}

/// Only files at or above the threshold land in `large_files`, and
/// directories never do, no matter their size.
#[test]
fn large_file_threshold() {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join("over.bin"), 1_500);
    write_bytes(&tmp.path().join("under.bin"), 990);
    let heavy_dir = tmp.path().join("heavy");
    fs::create_dir(&heavy_dir).unwrap();
    write_bytes(&heavy_dir.join("payload.bin"), 50_000);

    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &small_threshold(), &processed).unwrap();

    assert_eq!(result.large_files.len(), 1);
    assert_eq!(result.large_files[0].name, "over.bin");
    assert_eq!(result.large_files[0].size, 1_500);
    assert!(result.large_files.iter().all(|f| f.size >= 1_000));
}

/// Large files come back size-descending too.
#[test]
fn large_files_sorted_descending() {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join("a.bin"), 2_000);
    write_bytes(&tmp.path().join("b.bin"), 9_000);
    write_bytes(&tmp.path().join("c.bin"), 4_000);

    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &small_threshold(), &processed).unwrap();

    let sizes: Vec<u64> = result.large_files.iter().map(|f| f.size).collect();
    assert_eq!(sizes, vec![9_000, 4_000, 2_000]);
}

/// Equal-size large files come back in discovery order, matching the entry
/// list, so repeated scans of identical filesystem state agree even though
/// worker-completion order does not.
#[test]
fn equal_size_large_files_keep_discovery_order() {
    let tmp = TempDir::new().unwrap();
    for i in 0..40 {
        write_bytes(&tmp.path().join(format!("f{i:02}.bin")), 2_000);
    }

    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &small_threshold(), &processed).unwrap();

    let entry_names: Vec<&str> = result.entries.iter().map(|e| e.name.as_str()).collect();
    let large_names: Vec<&str> = result.large_files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(large_names, entry_names);

    let processed = AtomicU64::new(0);
    let again = scan_directory(tmp.path(), &small_threshold(), &processed).unwrap();
    let again_names: Vec<&str> = again.large_files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(large_names, again_names);
}

/// Directory children get cleanable flags from the fixed name allowlist.
#[test]
fn cleanable_directories_flagged() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("node_modules")).unwrap();
    fs::create_dir(tmp.path().join("sources")).unwrap();

    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &ScanLimits::default(), &processed).unwrap();

    let by_name = |name: &str| {
        result
            .entries
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("missing entry {name}"))
    };
    assert!(by_name("node_modules").is_cleanable);
    assert!(!by_name("sources").is_cleanable);
}

/// An unreadable root is the one fatal scan error.
#[test]
fn unreadable_root_fails_fast() {
    let tmp = TempDir::new().unwrap();
    let gone = tmp.path().join("missing");
    let processed = AtomicU64::new(0);
    let err = scan_directory(&gone, &ScanLimits::default(), &processed).unwrap_err();
    assert_eq!(err.path, gone);
}

/// An empty directory is a valid, empty result.
#[test]
fn empty_directory_scans_clean() {
    let tmp = TempDir::new().unwrap();
    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &ScanLimits::default(), &processed).unwrap();
    assert!(result.entries.is_empty());
    assert!(result.large_files.is_empty());
    assert_eq!(result.total_size, 0);
}

/// Many children exercise the full worker pool without losing any.
#[test]
fn wide_directory_keeps_every_child() {
    let tmp = TempDir::new().unwrap();
    for i in 0..200 {
        write_bytes(&tmp.path().join(format!("f{i:03}.bin")), 10 + i);
    }

    let processed = AtomicU64::new(0);
    let result = scan_directory(tmp.path(), &ScanLimits::default(), &processed).unwrap();

    assert_eq!(result.entries.len(), 200);
    assert_eq!(processed.load(Ordering::Relaxed), 200);
    // Strictly non-increasing sizes.
    assert!(result.entries.windows(2).all(|w| w[0].size >= w[1].size));
}
