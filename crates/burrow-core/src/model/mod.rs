//! Scan data model and display formatting.
pub mod entry;
pub mod size;

pub use entry::{DirEntry, HistoryFrame, LargeFileEntry, ScanResult};
