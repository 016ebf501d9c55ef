// Status bar widget: deck request status, selection count, last notice.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use deckopt_core::card::DECK_SIZE;

use crate::tui::{RequestStatus, ViewState};

/// Render the status bar into the given area.
///
/// Layout: [title] [deck status] | [selection count] | [notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::styled(
        " Deck Optimizer ",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )];

    let (dot, dot_color) = status_indicator(state.deck_status);
    spans.push(Span::styled(
        format!("{} ", dot),
        Style::default().fg(dot_color),
    ));

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        selection_counter(state.selection.len()),
        Style::default().fg(Color::White),
    ));

    if let Some(ref notice) = state.notice {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Status dot and its color for the deck request.
pub fn status_indicator(status: RequestStatus) -> (&'static str, Color) {
    match status {
        RequestStatus::Idle => ("●", Color::DarkGray),
        RequestStatus::Loading => ("●", Color::Yellow),
        RequestStatus::Complete => ("●", Color::Green),
        RequestStatus::Error => ("●", Color::Red),
    }
}

pub fn selection_counter(selected: usize) -> String {
    format!("Selected {}/{}", selected, DECK_SIZE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_indicator_colors() {
        assert_eq!(status_indicator(RequestStatus::Idle).1, Color::DarkGray);
        assert_eq!(status_indicator(RequestStatus::Loading).1, Color::Yellow);
        assert_eq!(status_indicator(RequestStatus::Complete).1, Color::Green);
        assert_eq!(status_indicator(RequestStatus::Error).1, Color::Red);
    }

    #[test]
    fn selection_counter_format() {
        assert_eq!(selection_counter(3), "Selected 3/8");
    }

    #[test]
    fn render_with_notice_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState {
            notice: Some("Zap is already selected".to_string()),
            ..Default::default()
        };
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Selected 0/8"));
        assert!(text.contains("Zap is already selected"));
    }
}
