//! Keyboard input dispatch. Global keys first, then the active panel's handler.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Panel};

/// Rows moved by PageUp/PageDown.
const PAGE: usize = 10;

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Global keys (always available).
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => { app.active_panel = Panel::Candidates; return; }
        KeyCode::Char('2') => { app.active_panel = Panel::Universe; return; }
        KeyCode::Char('3') => { app.active_panel = Panel::Help; return; }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Char('s') => {
            app.request_scan();
            return;
        }
        KeyCode::Char('x') | KeyCode::Esc => {
            app.cancel_scan();
            return;
        }
        _ => {}
    }

    // 2. Panel-specific keys.
    match app.active_panel {
        Panel::Candidates => handle_candidates_key(app, key),
        Panel::Universe => handle_universe_key(app, key),
        Panel::Help => {} // display only
    }
}

fn handle_candidates_key(app: &mut AppState, key: KeyEvent) {
    let count = app.candidates.row_count();
    let c = &mut app.candidates;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if c.cursor + 1 < count {
                c.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            c.cursor = c.cursor.saturating_sub(1);
        }
        KeyCode::PageDown => {
            c.cursor = (c.cursor + PAGE).min(count.saturating_sub(1));
        }
        KeyCode::PageUp => {
            c.cursor = c.cursor.saturating_sub(PAGE);
        }
        KeyCode::Char('g') | KeyCode::Home => c.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => c.cursor = count.saturating_sub(1),
        KeyCode::Char('a') => app.toggle_show_all(),
        KeyCode::Char('o') => app.cycle_sort(),
        _ => {}
    }
}

fn handle_universe_key(app: &mut AppState, key: KeyEvent) {
    let count = app.universe.row_count();
    let u = &mut app.universe;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if u.cursor + 1 < count {
                u.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            u.cursor = u.cursor.saturating_sub(1);
        }
        KeyCode::Char('g') | KeyCode::Home => u.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => u.cursor = count.saturating_sub(1),
        _ => {}
    }
}
