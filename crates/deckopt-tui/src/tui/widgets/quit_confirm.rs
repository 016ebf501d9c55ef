// Quit confirmation overlay widget.
//
// Centered modal shown on top of the dashboard while
// `ViewState::confirm_quit` is set. Mentions in-flight requests, whose
// results are dropped on exit.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::{RequestStatus, ViewState};

const DIALOG_WIDTH: u16 = 36;
const DIALOG_HEIGHT: u16 = 5;

/// Render the quit confirmation overlay centered in `area`.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let dialog = dialog_area(area);
    frame.render_widget(Clear, dialog);

    let key = |k: &'static str, color: Color| {
        Span::styled(k, Style::default().fg(color).add_modifier(Modifier::BOLD))
    };

    let mut lines = vec![Line::from(vec![
        Span::raw(" Leave the deck builder? ("),
        key("y", Color::Green),
        Span::raw("/"),
        key("n", Color::Red),
        Span::raw(")"),
    ])];
    if let Some(pending) = pending_label(state) {
        lines.push(Line::from(Span::styled(
            format!(" {} still running", pending),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Quit "),
        )
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog);
}

/// Which request would be abandoned by quitting now.
fn pending_label(state: &ViewState) -> Option<&'static str> {
    match (state.deck_status, state.analysis_status) {
        (RequestStatus::Loading, RequestStatus::Loading) => Some("Deck and analysis"),
        (RequestStatus::Loading, _) => Some("Deck request"),
        (_, RequestStatus::Loading) => Some("Analysis"),
        _ => None,
    }
}

/// Centered dialog rectangle, shrunk to fit small terminals.
fn dialog_area(area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(DIALOG_HEIGHT.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [dialog] = Layout::horizontal([Constraint::Length(DIALOG_WIDTH.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    dialog
}
