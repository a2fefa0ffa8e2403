//! Keyboard input

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use super::state::ViewerState;

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Pan,
    Zoom,
    Select,
    Focus,
    Reset,
    Help,
    None,
}

/// Apply `key` to `state`
pub fn handle_key_event(key: KeyEvent, state: &mut ViewerState) -> Action {
    if key.kind == KeyEventKind::Release {
        return Action::None;
    }

    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) | (_, KeyCode::Esc) => return Action::Quit,
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Action::Quit,
        (_, KeyCode::Char('?')) | (_, KeyCode::F(1)) => {
            state.show_help = !state.show_help;
            return Action::Help;
        }
        _ => {}
    }

    match key.code {
        KeyCode::Left | KeyCode::Char('h') => state.pan(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => state.pan(1, 0),
        KeyCode::Up | KeyCode::Char('k') => state.pan(0, -1),
        KeyCode::Down | KeyCode::Char('j') => state.pan(0, 1),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            state.zoom_in();
            return Action::Zoom;
        }
        KeyCode::Char('-') => {
            state.zoom_out();
            return Action::Zoom;
        }
        KeyCode::Tab | KeyCode::Char('n') => {
            state.select_next();
            return Action::Select;
        }
        KeyCode::BackTab | KeyCode::Char('p') => {
            state.select_prev();
            return Action::Select;
        }
        KeyCode::Enter => {
            state.focus_selected();
            return Action::Focus;
        }
        KeyCode::Char('0') | KeyCode::Char('r') => {
            state.reset_view();
            return Action::Reset;
        }
        KeyCode::Char('d') => {
            state.focus = state.focus.next();
            return Action::Focus;
        }
        _ => return Action::None,
    }
    Action::Pan
}

/// Poll for a key press, waiting at most `timeout`
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<KeyEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}
