//! Fixed name sets consumed by the scanner.
//!
//! Two static allowlists: system directories the scanner must never count
//! or descend into, and well-known build/dependency directory names that
//! get flagged as cleanable in scan results. Both match on the entry name
//! only, never on the full path.

/// Directory names excluded from scanning entirely.
#[cfg(windows)]
const SKIP_NAMES: &[&str] = &[
    "$Recycle.Bin",
    "System Volume Information",
    "Windows",
    "Program Files",
    "Program Files (x86)",
    "ProgramData",
    "Recovery",
    "Config.Msi",
];

#[cfg(not(windows))]
const SKIP_NAMES: &[&str] = &[
    ".Spotlight-V100",
    ".fseventsd",
    ".Trashes",
    ".DocumentRevisions-V100",
    "proc",
    "sys",
    "dev",
    "run",
    "lost+found",
];

/// Directory names that are typically safe to delete and regenerate:
/// package caches, virtualenvs, build output.
const CLEANABLE_NAMES: &[&str] = &[
    "node_modules",
    "vendor",
    ".venv",
    "venv",
    "__pycache__",
    ".pytest_cache",
    "target",
    "build",
    "dist",
    ".next",
    ".nuxt",
    ".turbo",
    ".parcel-cache",
    ".gradle",
    ".idea",
    ".vs",
];

/// Whether `name` is a system directory the scanner skips outright.
pub fn is_skipped(name: &str) -> bool {
    SKIP_NAMES.contains(&name)
}

/// Whether `name` marks a directory as cleanable (build artifacts,
/// dependency caches).
pub fn is_cleanable(name: &str) -> bool {
    CLEANABLE_NAMES.contains(&name)
}
