//! Burrow: interactive terminal disk-usage analyzer.
//!
//! Thin binary entry point. All logic lives in the `burrow-core` and
//! `burrow-tui` crates.
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "burrow", version, about = "Interactive disk-usage analyzer")]
struct Cli {
    /// Directory to analyze. Without one, start on the overview dashboard.
    path: Option<PathBuf>,

    /// Override the cache directory (default: ~/.cache/burrow).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = burrow_core::config::Config {
        cache_dir: cli.cache_dir,
        ..Default::default()
    };

    // Logs go to a file inside the cache directory: stderr belongs to the
    // TUI. Controlled with BURROW_LOG (e.g. BURROW_LOG=debug).
    let log_dir = config
        .cache_dir
        .clone()
        .or_else(burrow_core::cache::default_cache_dir);
    let _log_guard = log_dir.map(|dir| {
        let _ = std::fs::create_dir_all(&dir);
        let appender = tracing_appender::rolling::never(dir, "burrow.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("BURROW_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(writer)
            .with_ansi(false)
            .init();
        guard
    });

    tracing::info!("burrow starting");

    let start = match cli.path {
        Some(path) => Some(
            path.canonicalize()
                .with_context(|| format!("path does not exist: {}", path.display()))?,
        ),
        None => None,
    };

    burrow_tui::run(start, config)
}
