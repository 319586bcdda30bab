//! Burrow TUI: crossterm terminal frontend.
//!
//! All interaction logic lives in `burrow-core`; this crate owns the
//! terminal, translates key presses into engine commands, and redraws the
//! engine's state each tick.
pub mod input;
pub mod view;

use anyhow::{anyhow, Context};
use burrow_core::cache::CacheStore;
use burrow_core::config::Config;
use burrow_core::nav::{overview, Engine, FsRemover, Phase, Remover};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Input poll interval. Short enough that spinner frames and background
/// scan completions feel immediate.
const TICK: Duration = Duration::from_millis(80);

/// Puts the terminal into raw mode + alternate screen and restores it on
/// drop, so a panic or early return never leaves the shell unusable.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Run the interactive loop until the user quits.
///
/// With a `start` path the engine opens directly on that directory;
/// without one it starts on the overview dashboard.
pub fn run(start: Option<PathBuf>, config: Config) -> anyhow::Result<()> {
    let cache = Arc::new(
        CacheStore::open(config.cache_dir.clone(), config.policy.clone())
            .context("failed to open cache directory")?,
    );
    let remover: Arc<dyn Remover> = Arc::new(FsRemover);

    let mut engine = match start {
        Some(path) => {
            info!(path = %path.display(), "starting on directory");
            Engine::new(path, config, cache, remover)
        }
        None => {
            let home = overview::home_dir().ok_or_else(|| anyhow!("cannot resolve home directory"))?;
            info!("starting on overview dashboard");
            Engine::with_overview(home, config, cache, remover)
        }
    };

    let _guard = TerminalGuard::enter()?;
    let mut out = io::BufWriter::new(io::stdout());
    let mut show_large = false;
    let mut tick = 0usize;

    loop {
        let (cols, rows) = crossterm::terminal::size()?;
        engine.set_viewport_rows((rows as usize).saturating_sub(view::chrome_rows(show_large)).max(3));
        view::draw(&mut out, &engine, show_large, tick, cols, rows)?;
        out.flush()?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    match input::map_key(key) {
                        input::Action::Quit => {
                            if engine.phase() == Phase::ConfirmingDelete {
                                // `q` while confirming is a cancel, not a quit.
                                engine.handle_command(burrow_core::nav::Command::Cancel);
                            } else {
                                break;
                            }
                        }
                        input::Action::Engine(command) => engine.handle_command(command),
                        input::Action::ToggleLargePanel => show_large = !show_large,
                        input::Action::None => {}
                    }
                }
                _ => {}
            }
        }

        engine.poll_events();
        tick = tick.wrapping_add(1);
    }

    Ok(())
}
