// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app loop, or into local ViewState mutations (focus, cursors, picker
// search, question typing).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use deckopt_core::protocol::UserCommand;

use super::widgets::analysis;
use super::{Focus, ViewState};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app loop (add/remove a card, request a deck or an analysis, quit).
/// Returns `None` when the key was handled locally by mutating `ViewState`.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // crossterm emits Release events on some platforms
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.filter_mode {
        return handle_filter_mode(key_event, view_state);
    }

    if view_state.query_mode {
        return handle_query_mode(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Tab => {
            view_state.focus = view_state.focus.next();
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            move_cursor(view_state, -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(view_state, 1);
            None
        }
        KeyCode::Enter => match view_state.focus {
            Focus::Picker => view_state
                .highlighted_card()
                .map(|card| UserCommand::AddCard(card.name.clone())),
            Focus::Selection => remove_highlighted(view_state),
            Focus::Analysis => None,
        },
        KeyCode::Delete | KeyCode::Char('x') => remove_highlighted(view_state),
        KeyCode::Char('X') => Some(UserCommand::ClearSelection),
        KeyCode::Char('/') => {
            view_state.filter_mode = true;
            view_state.focus = Focus::Picker;
            None
        }
        KeyCode::Char('f') => {
            view_state.role_filter = view_state.role_filter.cycle();
            view_state.picker_cursor = 0;
            None
        }
        KeyCode::Esc => {
            view_state.filter_text.clear();
            view_state.role_filter = Default::default();
            view_state.picker_cursor = 0;
            None
        }
        KeyCode::Char('r') => Some(UserCommand::GenerateRandom),
        KeyCode::Char('c') => Some(UserCommand::CompleteDeck),
        KeyCode::Char('a') | KeyCode::Char('?') => {
            view_state.query_mode = true;
            view_state.focus = Focus::Analysis;
            None
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

/// Handle key events while the quit confirmation dialog is shown.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None, // Block all other input
    }
}

/// Handle key events while typing a picker search.
///
/// - Printable characters are appended to filter_text
/// - Backspace removes the last character
/// - Enter keeps the search, Esc clears it
fn handle_filter_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.filter_mode = false;
            view_state.filter_text.clear();
        }
        KeyCode::Enter => {
            view_state.filter_mode = false;
        }
        KeyCode::Backspace => {
            view_state.filter_text.pop();
        }
        KeyCode::Char(c) => {
            view_state.filter_text.push(c);
        }
        _ => {}
    }
    view_state.picker_cursor = 0;
    None
}

/// Handle key events while typing an analysis question.
///
/// Enter submits the question as typed and leaves the text in place so it
/// can be tweaked and resent. Esc leaves the input without sending.
fn handle_query_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.query_mode = false;
            None
        }
        KeyCode::Enter => {
            view_state.query_mode = false;
            Some(UserCommand::Analyze(view_state.query_text.clone()))
        }
        KeyCode::Backspace => {
            view_state.query_text.pop();
            None
        }
        KeyCode::Char(c) => {
            view_state.query_text.push(c);
            None
        }
        _ => None,
    }
}

fn remove_highlighted(view_state: &ViewState) -> Option<UserCommand> {
    view_state
        .highlighted_selected()
        .map(|card| UserCommand::RemoveCard(card.name.clone()))
}

/// Move the cursor of the focused panel by `delta`, clamped to its list.
fn move_cursor(view_state: &mut ViewState, delta: isize) {
    match view_state.focus {
        Focus::Picker => {
            let len = view_state.picker_cards().len();
            view_state.picker_cursor = step(view_state.picker_cursor, delta, len);
        }
        Focus::Selection => {
            let len = view_state.selection.len();
            view_state.selection_cursor = step(view_state.selection_cursor, delta, len);
        }
        Focus::Analysis => {
            let len = analysis::max_scroll(view_state) + 1;
            view_state.analysis_scroll = step(view_state.analysis_scroll, delta, len);
        }
    }
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
