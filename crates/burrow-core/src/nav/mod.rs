//! Navigation engine, the interactive state machine.
//!
//! The engine is the sole caller of the scan orchestrator and the cache; a
//! frontend feeds it discrete [`Command`]s and renders read-only snapshots
//! of its state. Scans and deletes run on named background threads and
//! deliver [`EngineEvent`]s over a channel drained by [`Engine::poll_events`],
//! so the interactive loop never blocks on I/O.
//!
//! Three view caches cooperate here, fastest first: the session history
//! stack (back-navigation restores a frame verbatim, no I/O), the session
//! map of previously visited directories, and the on-disk cache (strict
//! read for validity, stale read for an immediate paint while a checked
//! rescan runs behind it).
pub mod overview;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::model::{DirEntry, HistoryFrame, LargeFileEntry, ScanResult};
use crate::scanner;
use crossbeam_channel::{Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Engine phase. `Error` is still interactive: the user can go back,
/// refresh, or quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Browsing,
    ConfirmingDelete,
    Error,
}

/// The discrete input surface of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Descend into the directory under the cursor.
    Enter,
    /// Pop one history frame.
    Back,
    MoveUp,
    MoveDown,
    CursorTop,
    CursorBottom,
    /// Toggle the cursor entry in the multi-selection set.
    ToggleSelect,
    /// Request deletion of the cursor entry.
    Delete,
    /// Request deletion of the whole multi-selection set.
    DeleteSelected,
    /// Confirm the pending delete.
    Confirm,
    /// Cancel the pending delete.
    Cancel,
    /// Invalidate the current path and rescan.
    Refresh,
}

/// What a pending delete will remove.
#[derive(Debug, Clone)]
enum DeleteTarget {
    Single(PathBuf),
    Selection(Vec<PathBuf>),
}

impl DeleteTarget {
    fn paths(&self) -> Vec<PathBuf> {
        match self {
            DeleteTarget::Single(p) => vec![p.clone()],
            DeleteTarget::Selection(ps) => ps.clone(),
        }
    }
}

/// Completion messages delivered from background threads into the engine.
#[derive(Debug)]
pub enum EngineEvent {
    ScanFinished {
        path: PathBuf,
        result: ScanResult,
    },
    ScanFailed {
        path: PathBuf,
        message: String,
    },
    DeleteFinished {
        /// The directory being viewed when the delete was confirmed.
        view: PathBuf,
        error: Option<String>,
    },
    /// A background prefetch stored a rolled-up size for an overview root.
    OverviewSized {
        path: PathBuf,
        size: u64,
    },
}

/// The deletion primitive, injected so the engine never hard-codes how
/// items are removed (and so tests can substitute a fake).
///
/// Implementations are assumed recursive and permission-checked; the
/// engine only invokes them and interprets success or failure.
pub trait Remover: Send + Sync {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Default remover backed by `std::fs`.
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = std::fs::symlink_metadata(path)?;
        if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    }
}

pub struct Engine {
    config: Config,
    cache: Arc<CacheStore>,
    remover: Arc<dyn Remover>,
    tx: Sender<EngineEvent>,
    rx: Receiver<EngineEvent>,

    phase: Phase,
    path: PathBuf,
    entries: Vec<DirEntry>,
    large_files: Vec<LargeFileEntry>,
    total_size: u64,
    total_files: u64,
    is_overview: bool,

    /// Back-navigation stack; the only mechanism that avoids re-scanning a
    /// directory already visited this session when ascending.
    history: Vec<HistoryFrame>,
    /// Session-wide map of completed views, for descending into a
    /// directory visited earlier without touching the filesystem.
    session: HashMap<PathBuf, HistoryFrame>,

    selected: usize,
    entry_offset: usize,
    large_offset: usize,
    viewport_rows: usize,

    /// Directory-local multi-selection, independent of the cursor.
    multi_selected: HashSet<PathBuf>,
    pending_delete: Option<DeleteTarget>,
    last_error: Option<String>,

    /// Path currently being scanned. One scan runs at a time, so no two
    /// scans of one path (or two writers of one cache file) can race.
    in_flight: Option<PathBuf>,
    /// Scan requested while another was running; started as soon as the
    /// running scan completes.
    pending_scan: Option<PathBuf>,
    /// The in-flight scan's target was invalidated after the scan began;
    /// its result must be discarded, neither cached nor shown.
    in_flight_superseded: bool,
    /// A confirmed delete is still running on its background thread.
    deleting: bool,
    /// Scan result that arrived while a delete confirmation was pending;
    /// applied when the prompt is cancelled.
    deferred_result: Option<ScanResult>,
    /// The current view was painted from a stale cache record and a
    /// checked rescan is running behind it.
    background_refresh: bool,

    /// Items processed by the in-flight scan; shared with scan workers.
    progress: Arc<AtomicU64>,
    /// Expected item total for the in-flight scan, seeded from the cache.
    scan_total: u64,
    /// Number of filesystem scans started this session (instrumentation
    /// hook for cache-idempotence checks).
    scans_started: u64,
}

impl Engine {
    /// Create an engine viewing `start` and begin resolving that view
    /// (session cache, disk cache, or background scan).
    pub fn new(
        start: PathBuf,
        config: Config,
        cache: Arc<CacheStore>,
        remover: Arc<dyn Remover>,
    ) -> Self {
        let mut engine = Self::empty(start.clone(), config, cache, remover);
        engine.open(start);
        engine
    }

    /// Create an engine on the overview dashboard and start warming
    /// missing snapshots in the background.
    pub fn with_overview(
        home: PathBuf,
        config: Config,
        cache: Arc<CacheStore>,
        remover: Arc<dyn Remover>,
    ) -> Self {
        let mut engine = Self::empty(home.clone(), config, cache, remover);
        let roots = overview::overview_roots(&home);
        engine.entries = overview::overview_entries(&roots, &engine.cache);
        engine.total_size = engine.entries.iter().map(|e| e.size).sum();
        engine.total_files = engine.entries.len() as u64;
        engine.is_overview = true;
        engine.phase = Phase::Browsing;
        overview::spawn_prefetch(
            roots,
            engine.cache.clone(),
            engine.config.limits.clone(),
            engine.tx.clone(),
        );
        engine
    }

    fn empty(
        path: PathBuf,
        config: Config,
        cache: Arc<CacheStore>,
        remover: Arc<dyn Remover>,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            config,
            cache,
            remover,
            tx,
            rx,
            phase: Phase::Scanning,
            path,
            entries: Vec::new(),
            large_files: Vec::new(),
            total_size: 0,
            total_files: 0,
            is_overview: false,
            history: Vec::new(),
            session: HashMap::new(),
            selected: 0,
            entry_offset: 0,
            large_offset: 0,
            viewport_rows: 20,
            multi_selected: HashSet::new(),
            pending_delete: None,
            last_error: None,
            in_flight: None,
            pending_scan: None,
            in_flight_superseded: false,
            deleting: false,
            deferred_result: None,
            background_refresh: false,
            progress: Arc::new(AtomicU64::new(0)),
            scan_total: 0,
            scans_started: 0,
        }
    }

    // ── Read-only view ───────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn large_files(&self) -> &[LargeFileEntry] {
        &self.large_files
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn total_files(&self) -> u64 {
        self.total_files
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn entry_offset(&self) -> usize {
        self.entry_offset
    }

    pub fn large_offset(&self) -> usize {
        self.large_offset
    }

    pub fn is_overview(&self) -> bool {
        self.is_overview
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.multi_selected.contains(path)
    }

    pub fn selection_count(&self) -> usize {
        self.multi_selected.len()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// `(processed, expected)` for the in-flight scan. The expected total
    /// is a cache-seeded estimate and may be zero on a first visit.
    pub fn progress(&self) -> (u64, u64) {
        (self.progress.load(Ordering::Relaxed), self.scan_total)
    }

    /// The current view came from a stale cache record; a checked rescan
    /// is still running.
    pub fn refreshing_in_background(&self) -> bool {
        self.background_refresh
    }

    /// Human-readable description of what a pending delete will remove.
    pub fn pending_delete_label(&self) -> Option<String> {
        match self.pending_delete.as_ref()? {
            DeleteTarget::Single(path) => Some(path.display().to_string()),
            DeleteTarget::Selection(paths) => Some(format!("{} selected items", paths.len())),
        }
    }

    /// Filesystem scans started this session. Cache hits do not count.
    pub fn scans_started(&self) -> u64 {
        self.scans_started
    }

    /// Tell the engine how many entry rows the frontend can show, so
    /// cursor movement keeps the scroll offset in range.
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.clamp_scroll();
    }

    // ── Commands ─────────────────────────────────────────────────────────

    pub fn handle_command(&mut self, command: Command) {
        if self.phase == Phase::ConfirmingDelete {
            match command {
                Command::Confirm => self.execute_delete(),
                Command::Cancel => {
                    self.pending_delete = None;
                    self.phase = Phase::Browsing;
                    // A rescan that landed behind the prompt applies now.
                    if let Some(result) = self.deferred_result.take() {
                        self.adopt_result(result);
                    }
                }
                _ => {}
            }
            return;
        }

        match command {
            Command::Enter => self.enter(),
            Command::Back => self.back(),
            Command::MoveUp => self.move_cursor(-1),
            Command::MoveDown => self.move_cursor(1),
            Command::CursorTop => {
                self.selected = 0;
                self.clamp_scroll();
            }
            Command::CursorBottom => {
                self.selected = self.entries.len().saturating_sub(1);
                self.clamp_scroll();
            }
            Command::ToggleSelect => self.toggle_select(),
            Command::Delete => self.request_delete(),
            Command::DeleteSelected => self.request_delete_selection(),
            Command::Refresh => self.refresh(),
            Command::Confirm | Command::Cancel => {}
        }
    }

    /// Drain pending background events. Returns `true` if state changed.
    pub fn poll_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            self.apply_event(event);
            changed = true;
        }
        changed
    }

    // ── Navigation ───────────────────────────────────────────────────────

    fn enter(&mut self) {
        if self.phase != Phase::Browsing {
            return;
        }
        let Some(entry) = self.entries.get(self.selected) else {
            return;
        };
        if !entry.is_dir {
            return;
        }
        let target = entry.path.clone();
        self.history.push(self.snapshot_frame());
        // Selections are directory-local.
        self.multi_selected.clear();
        self.open(target);
    }

    fn back(&mut self) {
        let Some(frame) = self.history.pop() else {
            return;
        };
        self.path = frame.path;
        self.entries = frame.entries;
        self.large_files = frame.large_files;
        self.total_size = frame.total_size;
        self.total_files = frame.total_files;
        self.selected = frame.selected;
        self.entry_offset = frame.entry_offset;
        self.large_offset = frame.large_offset;
        self.is_overview = frame.is_overview;
        self.multi_selected.clear();
        self.background_refresh = false;
        self.last_error = None;
        self.phase = Phase::Browsing;
    }

    fn refresh(&mut self) {
        if self.is_overview {
            // The overview is rebuilt from the snapshot tier, not scanned.
            let roots = overview::overview_roots(&self.path);
            self.entries = overview::overview_entries(&roots, &self.cache);
            self.total_size = self.entries.iter().map(|e| e.size).sum();
            self.total_files = self.entries.len() as u64;
            self.clamp_cursor();
            return;
        }
        let path = self.path.clone();
        self.cache.invalidate(&path);
        self.session.remove(&path);
        if self.in_flight.as_deref() == Some(path.as_path()) {
            // The running scan predates the invalidation.
            self.in_flight_superseded = true;
        }
        self.last_error = None;
        self.phase = Phase::Scanning;
        self.spawn_scan(path);
    }

    /// Resolve a view for `path`: session map first, then a strict cache
    /// read, then a stale read with a background rescan, then a scan.
    fn open(&mut self, path: PathBuf) {
        self.path = path.clone();
        self.selected = 0;
        self.entry_offset = 0;
        self.large_offset = 0;
        self.is_overview = false;
        self.last_error = None;
        self.background_refresh = false;

        if let Some(frame) = self.session.get(&path) {
            debug!(path = %path.display(), "session cache hit");
            self.entries = frame.entries.clone();
            self.large_files = frame.large_files.clone();
            self.total_size = frame.total_size;
            self.total_files = frame.total_files;
            self.phase = Phase::Browsing;
            return;
        }

        match self.cache.load(&path) {
            Ok(record) => {
                debug!(path = %path.display(), "disk cache hit");
                self.adopt_result(record.result);
                return;
            }
            Err(miss) => debug!(path = %path.display(), %miss, "disk cache miss"),
        }

        if let Ok(record) = self.cache.load_stale(&path) {
            // Paint immediately, rescan behind the paint. The stale view is
            // display-only and is replaced when the rescan lands.
            debug!(path = %path.display(), "stale cache paint");
            self.adopt_result(record.result);
            self.background_refresh = true;
            self.spawn_scan(path);
            return;
        }

        self.phase = Phase::Scanning;
        self.spawn_scan(path);
    }

    fn adopt_result(&mut self, result: ScanResult) {
        self.entries = result.entries;
        self.large_files = result.large_files;
        self.total_size = result.total_size;
        self.total_files = result.total_files;
        self.phase = Phase::Browsing;
        self.clamp_cursor();
        self.session.insert(self.path.clone(), self.snapshot_frame());
    }

    fn snapshot_frame(&self) -> HistoryFrame {
        HistoryFrame {
            path: self.path.clone(),
            entries: self.entries.clone(),
            large_files: self.large_files.clone(),
            total_size: self.total_size,
            total_files: self.total_files,
            selected: self.selected,
            entry_offset: self.entry_offset,
            large_offset: self.large_offset,
            is_overview: self.is_overview,
        }
    }

    // ── Cursor & selection ───────────────────────────────────────────────

    fn move_cursor(&mut self, delta: isize) {
        if self.entries.is_empty() {
            return;
        }
        let last = self.entries.len() - 1;
        self.selected = self
            .selected
            .saturating_add_signed(delta)
            .min(last);
        self.clamp_scroll();
    }

    fn clamp_cursor(&mut self) {
        if self.selected >= self.entries.len() {
            self.selected = self.entries.len().saturating_sub(1);
        }
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        if self.selected < self.entry_offset {
            self.entry_offset = self.selected;
        } else if self.selected >= self.entry_offset + self.viewport_rows {
            self.entry_offset = self.selected + 1 - self.viewport_rows;
        }
    }

    fn toggle_select(&mut self) {
        if self.phase != Phase::Browsing || self.is_overview {
            return;
        }
        let Some(entry) = self.entries.get(self.selected) else {
            return;
        };
        if !self.multi_selected.remove(&entry.path) {
            self.multi_selected.insert(entry.path.clone());
        }
    }

    // ── Delete flow ──────────────────────────────────────────────────────

    fn request_delete(&mut self) {
        if self.phase != Phase::Browsing || self.is_overview {
            return;
        }
        let Some(entry) = self.entries.get(self.selected) else {
            return;
        };
        self.pending_delete = Some(DeleteTarget::Single(entry.path.clone()));
        self.phase = Phase::ConfirmingDelete;
    }

    fn request_delete_selection(&mut self) {
        if self.phase != Phase::Browsing || self.is_overview || self.multi_selected.is_empty() {
            return;
        }
        let mut paths: Vec<PathBuf> = self.multi_selected.iter().cloned().collect();
        paths.sort();
        self.pending_delete = Some(DeleteTarget::Selection(paths));
        self.phase = Phase::ConfirmingDelete;
    }

    fn execute_delete(&mut self) {
        let Some(target) = self.pending_delete.take() else {
            self.phase = Phase::Browsing;
            return;
        };
        let targets = target.paths();
        info!(count = targets.len(), "delete confirmed");
        self.phase = Phase::Scanning;
        self.deleting = true;
        // Anything scanned before the delete is stale once it runs.
        self.deferred_result = None;

        let view = self.path.clone();
        let remover = self.remover.clone();
        let cache = self.cache.clone();
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("burrow-delete".into())
            .spawn(move || {
                for target in &targets {
                    if let Err(err) = remover.remove(target) {
                        let _ = tx.send(EngineEvent::DeleteFinished {
                            view,
                            error: Some(format!("failed to delete {}: {err}", target.display())),
                        });
                        return;
                    }
                    // The deleted item may have its own cached record.
                    cache.invalidate(target);
                }
                let _ = tx.send(EngineEvent::DeleteFinished { view, error: None });
            });
        if let Err(err) = spawned {
            self.deleting = false;
            self.last_error = Some(format!("failed to start delete: {err}"));
            self.phase = Phase::Browsing;
        }
    }

    // ── Background work ──────────────────────────────────────────────────

    /// Request a scan of `path`. Scans of the same path are serialized: a
    /// request for the path already being scanned is a no-op unless that
    /// scan was superseded by an invalidation. One scan runs at a time;
    /// any other request waits in the pending slot (newest wins) and
    /// starts the moment the running scan completes.
    fn spawn_scan(&mut self, path: PathBuf) {
        if let Some(running) = &self.in_flight {
            if *running == path && !self.in_flight_superseded {
                return;
            }
            self.pending_scan = Some(path);
            return;
        }
        self.start_scan(path);
    }

    /// Clear the in-flight slot if `path` is the scan that just completed.
    /// Returns whether that scan had been superseded by an invalidation.
    fn finish_in_flight(&mut self, path: &Path) -> bool {
        if self.in_flight.as_deref() != Some(path) {
            return false;
        }
        let superseded = self.in_flight_superseded;
        self.in_flight = None;
        self.in_flight_superseded = false;
        superseded
    }

    fn start_pending_scan(&mut self) {
        if self.in_flight.is_none() {
            if let Some(next) = self.pending_scan.take() {
                self.start_scan(next);
            }
        }
    }

    fn start_scan(&mut self, path: PathBuf) {
        self.in_flight = Some(path.clone());
        self.in_flight_superseded = false;
        self.scans_started += 1;
        self.progress.store(0, Ordering::Relaxed);
        self.scan_total = self.cache.peek_total_files(&path).unwrap_or(0);

        let limits = self.config.limits.clone();
        let processed = self.progress.clone();
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("burrow-scan".into())
            .spawn(move || {
                info!(path = %path.display(), "scan started");
                match scanner::scan_directory(&path, &limits, &processed) {
                    Ok(result) => {
                        let _ = tx.send(EngineEvent::ScanFinished { path, result });
                    }
                    Err(err) => {
                        let _ = tx.send(EngineEvent::ScanFailed {
                            path,
                            message: err.to_string(),
                        });
                    }
                }
            });
        if spawned.is_err() {
            self.in_flight = None;
            self.last_error = Some("failed to start scan thread".into());
            self.phase = Phase::Error;
        }
    }

    fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::ScanFinished { path, result } => {
                let superseded = self.finish_in_flight(&path);
                if superseded {
                    // Invalidated while the scan ran; neither cached nor shown.
                    debug!(path = %path.display(), "discarding superseded scan result");
                    self.start_pending_scan();
                    return;
                }
                if let Err(err) = self.cache.save(&path, &result) {
                    warn!(path = %path.display(), %err, "failed to write cache record");
                }
                self.cache.store_overview_size(&path, result.total_size);
                self.start_pending_scan();
                if path != self.path {
                    // The user navigated away; the result went to the cache
                    // but must not be applied to the current view.
                    debug!(path = %path.display(), "discarding scan result for abandoned view");
                    return;
                }
                if self.deleting {
                    // A delete of this view is still running; the pre-delete
                    // listing must not resurface. The post-delete rescan
                    // repaints.
                    return;
                }
                if self.phase == Phase::ConfirmingDelete {
                    // Never yank the confirmation prompt from under the user;
                    // the result applies if the delete is cancelled.
                    self.background_refresh = false;
                    self.deferred_result = Some(result);
                    return;
                }
                let keep_cursor = self.background_refresh;
                self.background_refresh = false;
                self.adopt_result(result);
                if !keep_cursor {
                    self.selected = 0;
                    self.entry_offset = 0;
                }
                self.clamp_cursor();
            }
            EngineEvent::ScanFailed { path, message } => {
                let superseded = self.finish_in_flight(&path);
                self.start_pending_scan();
                if superseded || path != self.path || self.deleting {
                    return;
                }
                if self.phase == Phase::ConfirmingDelete {
                    // Keep the prompt; the background refresh simply did not
                    // land.
                    self.background_refresh = false;
                    self.last_error = Some(message);
                    return;
                }
                warn!(path = %path.display(), %message, "scan failed");
                self.background_refresh = false;
                self.last_error = Some(message);
                self.phase = Phase::Error;
            }
            EngineEvent::DeleteFinished { view, error } => {
                self.deleting = false;
                if let Some(message) = error {
                    // Surface and stay put: no rescan after a failed delete.
                    warn!(%message, "delete failed");
                    self.last_error = Some(message);
                    if view == self.path {
                        self.phase = Phase::Browsing;
                    }
                    return;
                }
                self.multi_selected.clear();
                self.cache.invalidate(&view);
                self.session.remove(&view);
                if self.in_flight.as_deref() == Some(view.as_path()) {
                    // The running scan listed the view before the delete.
                    self.in_flight_superseded = true;
                }
                if view == self.path {
                    self.phase = Phase::Scanning;
                    self.spawn_scan(view);
                }
            }
            EngineEvent::OverviewSized { path, size } => {
                if !self.is_overview {
                    return;
                }
                if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
                    entry.size = size;
                    self.entries.sort_by(|a, b| b.size.cmp(&a.size));
                    self.total_size = self.entries.iter().map(|e| e.size).sum();
                    self.clamp_cursor();
                }
            }
        }
    }
}
