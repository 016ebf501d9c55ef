// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------+------------------------------+
// | Card Picker (40%) | Selection (50%) | Deck (50%) |
// |                   +------------------------------+
// |                   | Analysis (fill)              |
// |                   +------------------------------+
// |                   | Question (3 rows)            |
// +-------------------+------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: title, deck request status, selection count, notices.
    pub status_bar: Rect,
    /// Left column: searchable card catalog.
    pub picker: Rect,
    /// Right column top-left: cards chosen for a custom deck.
    pub selection: Rect,
    /// Right column top-right: the current deck and its summary.
    pub deck: Rect,
    /// Right column middle: formatted analysis text.
    pub analysis: Rect,
    /// Right column bottom: analysis question input.
    pub query: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Rows needed to show a full deck plus borders and the summary lines.
const DECK_ROW_HEIGHT: u16 = 14;

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | middle(fill) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(10),   // picker + right column
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let middle = vertical[1];
    let help_bar = vertical[2];

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(middle);

    let picker = horizontal[0];
    let right = horizontal[1];

    // Right column: selection/deck row | analysis | question input
    let right_sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(DECK_ROW_HEIGHT),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(right);

    let top_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right_sections[0]);

    AppLayout {
        status_bar,
        picker,
        selection: top_row[0],
        deck: top_row[1],
        analysis: right_sections[1],
        query: right_sections[2],
        help_bar,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
