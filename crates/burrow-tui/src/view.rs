//! Line-oriented renderer.
//!
//! Draws the whole screen each tick: header, status, optional large-file
//! panel, the entry list with size bars, and a key footer. The engine owns
//! selection and scroll state; this module only reads it.
use burrow_core::model::size::{format_count, format_size};
use burrow_core::nav::{Engine, Phase};
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use std::io::{self, Write};

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];
const BAR_WIDTH: usize = 20;
const LARGE_PANEL_ROWS: usize = 8;

/// Rows consumed by everything that is not the entry list.
pub fn chrome_rows(show_large: bool) -> usize {
    let base = 7; // header, path, blank, status, blank, blank, footer
    if show_large {
        base + LARGE_PANEL_ROWS + 2
    } else {
        base
    }
}

pub fn draw(
    out: &mut impl Write,
    engine: &Engine,
    show_large: bool,
    tick: usize,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    let title = if engine.is_overview() {
        "burrow — overview"
    } else {
        "burrow — disk usage"
    };
    queue!(out, Print(title.magenta().bold()), Print("\r\n"))?;
    queue!(
        out,
        Print(truncate(&engine.current_path().display().to_string(), cols as usize).dark_grey()),
        Print("\r\n\r\n")
    )?;

    match engine.phase() {
        Phase::ConfirmingDelete => {
            let label = engine.pending_delete_label().unwrap_or_default();
            queue!(
                out,
                SetForegroundColor(Color::Red),
                Print(format!("Delete {label}? (y/n)")),
                ResetColor,
                Print("\r\n")
            )?;
            return out.flush();
        }
        Phase::Scanning => {
            let spin = SPINNER[tick % SPINNER.len()];
            let (done, expected) = engine.progress();
            queue!(out, Print(format!("{spin} Scanning…").cyan()), Print("\r\n"))?;
            if expected > 0 {
                queue!(
                    out,
                    Print(
                        format!("  {} / {} items", format_count(done), format_count(expected))
                            .dark_grey()
                    ),
                    Print("\r\n")
                )?;
            }
            return out.flush();
        }
        Phase::Error => {
            let message = engine.last_error().unwrap_or("unknown error");
            queue!(
                out,
                SetForegroundColor(Color::Red),
                Print(format!("Error: {message}")),
                ResetColor,
                Print("\r\n\r\n")
            )?;
        }
        Phase::Browsing => {
            if let Some(message) = engine.last_error() {
                queue!(
                    out,
                    SetForegroundColor(Color::Red),
                    Print(format!("Error: {message}")),
                    ResetColor,
                    Print("\r\n")
                )?;
            }
        }
    }

    let refreshing = if engine.refreshing_in_background() {
        "  (refreshing…)"
    } else {
        ""
    };
    queue!(
        out,
        Print("  Total: "),
        Print(format_size(engine.total_size()).yellow()),
        Print(refreshing.dark_grey()),
        Print("\r\n\r\n")
    )?;

    if show_large {
        draw_large_panel(out, engine, cols)?;
    }

    draw_entries(out, engine, show_large, cols, rows)?;

    queue!(
        out,
        Print("\r\n"),
        Print(
            "↑↓ navigate  ↵ enter  ← back  space select  d delete  D delete selected  f large  r refresh  q quit"
                .dark_grey()
        ),
        Print("\r\n")
    )?;
    out.flush()
}

fn draw_large_panel(out: &mut impl Write, engine: &Engine, cols: u16) -> io::Result<()> {
    queue!(out, Print("Large files:".cyan().bold()), Print("\r\n"))?;
    let files = engine.large_files();
    let start = engine.large_offset().min(files.len());
    let shown = &files[start..files.len().min(start + LARGE_PANEL_ROWS)];
    for file in shown {
        let line = format!(
            "  {:>9}  {}",
            format_size(file.size),
            truncate(&file.path.display().to_string(), cols.saturating_sub(14) as usize)
        );
        queue!(out, Print(line), Print("\r\n"))?;
    }
    let hidden = files.len().saturating_sub(start + shown.len());
    if hidden > 0 {
        queue!(
            out,
            Print(format!("  … and {hidden} more").dark_grey()),
            Print("\r\n")
        )?;
    }
    if files.is_empty() {
        queue!(out, Print("  (none)".dark_grey()), Print("\r\n"))?;
    }
    queue!(out, Print("\r\n"))?;
    Ok(())
}

fn draw_entries(
    out: &mut impl Write,
    engine: &Engine,
    show_large: bool,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    let visible = (rows as usize).saturating_sub(chrome_rows(show_large)).max(3);
    let entries = engine.entries();
    let start = engine.entry_offset().min(entries.len());
    let end = entries.len().min(start + visible);

    for (i, entry) in entries[start..end].iter().enumerate() {
        let index = start + i;
        let cursor = index == engine.selected();
        let marked = engine.is_selected(&entry.path);

        let prefix = if cursor {
            "➤ ".cyan()
        } else if marked {
            "✓ ".green()
        } else {
            "  ".stylize()
        };
        let icon = if entry.is_cleanable {
            '🧹'
        } else if entry.is_dir {
            '📁'
        } else {
            '📄'
        };

        let pct = if engine.total_size() > 0 {
            entry.size as f64 / engine.total_size() as f64 * 100.0
        } else {
            0.0
        };
        let filled = ((pct / 100.0) * BAR_WIDTH as f64) as usize;
        let bar: String = "█".repeat(filled) + &"░".repeat(BAR_WIDTH - filled);

        let name_width = (cols as usize).saturating_sub(42);
        let name = truncate(&entry.name, name_width);

        queue!(out, Print(prefix), Print(icon), Print(' '))?;
        queue!(out, Print(format!("{:>9}", format_size(entry.size)).yellow()))?;
        queue!(out, Print(' '), Print(bar.dark_grey()), Print(format!(" {pct:4.1}% ")))?;
        if cursor {
            queue!(out, Print(name.cyan().bold()))?;
        } else {
            queue!(out, Print(name.stylize()))?;
        }
        queue!(out, Print("\r\n"))?;
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let tail: String = text
        .chars()
        .skip(count.saturating_sub(max.saturating_sub(1)))
        .collect();
    format!("…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_the_tail() {
        assert_eq!(truncate("/very/long/path/to/file", 8), "…to/file");
        assert_eq!(truncate("short", 8), "short");
        assert_eq!(truncate("x", 0), "");
    }

    #[test]
    fn chrome_grows_with_large_panel() {
        assert!(chrome_rows(true) > chrome_rows(false));
    }
}
