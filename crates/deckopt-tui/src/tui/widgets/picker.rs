// Card picker widget: searchable, role-filterable table of catalog cards.
//
// Columns: Name, Role, Cost, Rarity. Cards already in the selection are
// hidden. The cursor row is highlighted and kept in view.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use deckopt_core::card::{Card, CardRole};
use deckopt_core::catalog::RoleFilter;

use super::focused_border_style;
use crate::tui::ViewState;

/// Render the card picker into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, focused: bool) {
    let cards = state.picker_cards();
    let title = build_title(state, cards.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focused_border_style(focused, Style::default()));

    if cards.is_empty() {
        let paragraph = Paragraph::new(placeholder_text(state))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Role"),
        Cell::from("Cost"),
        Cell::from("Rarity"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = cards.iter().map(|card| card_row(card)).collect();

    let widths = [
        Constraint::Min(14),
        Constraint::Length(14),
        Constraint::Length(4),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut table_state = TableState::default().with_selected(Some(state.picker_cursor));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn card_row(card: &Card) -> Row<'static> {
    Row::new(vec![
        Cell::from(card.name.clone()),
        Cell::from(Span::styled(
            card.role.label(),
            Style::default().fg(role_color(card.role)),
        )),
        Cell::from(card.elixir_cost.to_string()),
        Cell::from(card.rarity_or_default().to_string()),
    ])
}

/// Color used for a role label across panels.
pub fn role_color(role: CardRole) -> Color {
    match role {
        CardRole::WinCondition => Color::Magenta,
        CardRole::Support => Color::Blue,
        CardRole::Spell => Color::Yellow,
        CardRole::Defense => Color::Green,
        CardRole::Building => Color::Cyan,
        CardRole::Unknown => Color::DarkGray,
    }
}

/// Title with role filter, search text, and match count.
fn build_title(state: &ViewState, count: usize) -> Line<'static> {
    let mut title = String::from("Cards");
    if let RoleFilter::Only(_) = state.role_filter {
        title.push_str(&format!(" [{}]", state.role_filter.label()));
    }
    if state.filter_mode || !state.filter_text.is_empty() {
        let cursor = if state.filter_mode { "_" } else { "" };
        title.push_str(&format!(" /{}{}", state.filter_text, cursor));
    }
    title.push_str(&format!(" ({})", count));
    Line::from(title)
}

fn placeholder_text(state: &ViewState) -> &'static str {
    if state.catalog.is_empty() {
        "  No cards loaded."
    } else if state.selection.len() == state.catalog.len() {
        "  Every card is selected."
    } else {
        "  No cards match the filter."
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
