// Analysis widget: the formatted analysis of the current deck, plus the
// question input line below it.
//
// Header: one-line summary of the analyzed deck (cards with costs, average)
// Body: sections with bold titles, bullet items, paragraphs; emphasis bold

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block as BlockWidget, Borders, Paragraph, Wrap};
use ratatui::Frame;

use deckopt_core::card::Deck;
use deckopt_core::formatter::{AnalysisDocument, Block, Span as DocSpan};

use super::focused_border_style;
use crate::tui::{RequestStatus, ViewState};

/// Render the analysis panel into the given area.
///
/// When `focused` is true, Up/Down scroll the body.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, focused: bool) {
    let lines = panel_lines(state);
    let scroll = state.analysis_scroll.min(lines.len().saturating_sub(1));

    let border = focused_border_style(focused, border_style(state.analysis_status));
    let paragraph = Paragraph::new(lines)
        .block(
            BlockWidget::default()
                .borders(Borders::ALL)
                .title(build_title(state.analysis_status))
                .border_style(border),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

/// Everything the panel body shows: deck summary, error, then the document
/// or a placeholder.
pub fn panel_lines(state: &ViewState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(ref deck) = state.deck {
        lines.push(deck_summary(deck));
        lines.push(Line::default());
    }

    if let Some(ref error) = state.analysis_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::default());
    }

    match state.analysis {
        Some(ref doc) if !doc.is_empty() => lines.extend(document_lines(doc)),
        _ => lines.push(Line::from(Span::styled(
            placeholder_text(state.analysis_status, state.deck.is_some()),
            Style::default().fg(Color::DarkGray),
        ))),
    }
    lines
}

/// Largest scroll offset that still leaves the last line on screen.
pub fn max_scroll(state: &ViewState) -> usize {
    panel_lines(state).len().saturating_sub(1)
}

/// Render the single-line question input.
pub fn render_query(frame: &mut Frame, area: Rect, state: &ViewState) {
    let text = if state.query_mode {
        Line::from(vec![
            Span::raw(state.query_text.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else if state.query_text.is_empty() {
        Line::from(Span::styled(
            "Press a to ask about your deck",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(state.query_text.clone())
    };

    let border = if state.query_mode {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(text).block(
        BlockWidget::default()
            .borders(Borders::ALL)
            .title("Question")
            .border_style(border),
    );
    frame.render_widget(paragraph, area);
}

/// One-line summary of the analyzed deck: `Hog Rider (4), Zap (2) | Avg 3.00`.
pub fn deck_summary(deck: &Deck) -> Line<'static> {
    let cards = deck
        .cards
        .iter()
        .map(|c| format!("{} ({})", c.name, c.elixir_cost))
        .collect::<Vec<_>>()
        .join(", ");
    Line::from(vec![
        Span::styled(cards, Style::default().fg(Color::White)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("Avg {}", deck.average_elixir_display()),
            Style::default().fg(Color::Magenta),
        ),
    ])
}

/// Convert a parsed analysis into styled lines. Sections are separated by
/// a blank line.
pub fn document_lines(doc: &AnalysisDocument) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, section) in doc.sections.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        if let Some(ref title) = section.title {
            lines.push(Line::from(Span::styled(
                title.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )));
        }
        for block in &section.blocks {
            let mut spans = Vec::new();
            if let Block::ListItem(_) = block {
                spans.push(Span::styled("  • ", Style::default().fg(Color::Cyan)));
            }
            spans.extend(block.spans().iter().map(styled_span));
            lines.push(Line::from(spans));
        }
    }
    lines
}

fn styled_span(span: &DocSpan) -> Span<'static> {
    match span {
        DocSpan::Plain(text) => Span::raw(text.clone()),
        DocSpan::Emphasis(text) => {
            Span::styled(text.clone(), Style::default().add_modifier(Modifier::BOLD))
        }
    }
}

fn build_title(status: RequestStatus) -> Line<'static> {
    let (status_text, status_color) = status_indicator(status);
    Line::from(vec![
        Span::styled("Analysis", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" -- ", Style::default().fg(Color::DarkGray)),
        Span::styled(status_text, Style::default().fg(status_color)),
    ])
}

/// Return status text and color for the analysis lane.
pub fn status_indicator(status: RequestStatus) -> (&'static str, Color) {
    match status {
        RequestStatus::Idle => ("idle", Color::DarkGray),
        RequestStatus::Loading => ("analyzing...", Color::Yellow),
        RequestStatus::Complete => ("complete", Color::Green),
        RequestStatus::Error => ("error", Color::Red),
    }
}

fn border_style(status: RequestStatus) -> Style {
    match status {
        RequestStatus::Loading => Style::default().fg(Color::Yellow),
        RequestStatus::Error => Style::default().fg(Color::Red),
        _ => Style::default(),
    }
}

fn placeholder_text(status: RequestStatus, has_deck: bool) -> &'static str {
    match status {
        RequestStatus::Loading => "Analyzing...",
        RequestStatus::Complete => "The analysis came back empty.",
        RequestStatus::Error => "",
        RequestStatus::Idle if has_deck => "Ask a question to analyze this deck.",
        RequestStatus::Idle => "Generate a deck, then ask a question about it.",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
