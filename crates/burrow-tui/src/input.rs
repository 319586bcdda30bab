//! Key → engine-command mapping.
//!
//! The engine ignores commands that make no sense in its current phase, so
//! the mapping can stay context-free: `y`/`n` are simply `Confirm`/`Cancel`
//! and are no-ops outside the confirmation prompt.
use burrow_core::nav::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks the frontend to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Engine(Command),
    /// Toggle the large-files panel (display-only, never reaches the engine).
    ToggleLargePanel,
    Quit,
    None,
}

pub fn map_key(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::Engine(Command::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Action::Engine(Command::MoveDown),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => Action::Engine(Command::Enter),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Backspace => Action::Engine(Command::Back),
        KeyCode::Char(' ') => Action::Engine(Command::ToggleSelect),
        KeyCode::Char('d') | KeyCode::Delete => Action::Engine(Command::Delete),
        KeyCode::Char('D') => Action::Engine(Command::DeleteSelected),
        KeyCode::Char('y') | KeyCode::Char('Y') => Action::Engine(Command::Confirm),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Action::Engine(Command::Cancel),
        KeyCode::Char('r') => Action::Engine(Command::Refresh),
        KeyCode::Char('g') => Action::Engine(Command::CursorTop),
        KeyCode::Char('G') => Action::Engine(Command::CursorBottom),
        KeyCode::Char('f') => Action::ToggleLargePanel,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn navigation_keys_map_to_commands() {
        assert_eq!(map_key(press(KeyCode::Enter)), Action::Engine(Command::Enter));
        assert_eq!(map_key(press(KeyCode::Char('j'))), Action::Engine(Command::MoveDown));
        assert_eq!(map_key(press(KeyCode::Backspace)), Action::Engine(Command::Back));
        assert_eq!(map_key(press(KeyCode::Char('D'))), Action::Engine(Command::DeleteSelected));
    }

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        };
        assert_eq!(map_key(key), Action::Quit);
    }

    #[test]
    fn unknown_keys_do_nothing() {
        assert_eq!(map_key(press(KeyCode::Char('z'))), Action::None);
    }
}
