// Deck widget: the current deck, its average elixir, role mix, and any
// warnings the server attached.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use deckopt_core::card::{Deck, DECK_SIZE};

use super::picker::role_color;
use crate::tui::{RequestStatus, ViewState};

/// Render the deck panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match (&state.deck, state.deck_status) {
        (_, RequestStatus::Loading) => vec![placeholder("  Building deck...")],
        (_, RequestStatus::Error) => {
            let message = state.deck_error.as_deref().unwrap_or("Request failed");
            vec![Line::from(Span::styled(
                format!("  {}", message),
                Style::default().fg(Color::Red),
            ))]
        }
        (Some(deck), _) => deck_lines(deck, &state.warnings),
        (None, _) => vec![
            placeholder("  No deck yet."),
            placeholder("  r: random deck"),
            placeholder("  c: complete your selection"),
        ],
    };

    let border = match state.deck_status {
        RequestStatus::Loading => Style::default().fg(Color::Yellow),
        RequestStatus::Error => Style::default().fg(Color::Red),
        _ => Style::default(),
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Deck")
                .border_style(border),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn placeholder(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

/// Card list followed by the summary and warning lines.
pub fn deck_lines(deck: &Deck, warnings: &[String]) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = deck
        .cards
        .iter()
        .map(|card| {
            Line::from(vec![
                Span::styled(
                    format!(" {:>2} ", card.elixir_cost),
                    Style::default().fg(Color::Magenta),
                ),
                Span::raw(card.name.clone()),
            ])
        })
        .collect();

    let count_style = if deck.is_complete() {
        Style::default()
    } else {
        Style::default().fg(Color::Yellow)
    };
    lines.push(Line::from(vec![
        Span::styled(
            " Avg elixir: ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(deck.average_elixir_display()),
        Span::styled(format!("  {}/{} cards", deck.len(), DECK_SIZE), count_style),
    ]));

    let mut roles = vec![Span::raw(" ")];
    for (role, count) in deck.role_breakdown() {
        roles.push(Span::styled(
            format!("{} {}  ", role.label(), count),
            Style::default().fg(role_color(role)),
        ));
    }
    lines.push(Line::from(roles));

    for warning in warnings {
        lines.push(Line::from(Span::styled(
            format!(" ! {}", warning),
            Style::default().fg(Color::Yellow),
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckopt_core::card::{Card, CardRole};

    fn render_to_text(state: &ViewState) -> String {
        let backend = ratatui::backend::TestBackend::new(50, 16);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn deck() -> Deck {
        Deck::new(
            vec![
                Card::new("Hog Rider", CardRole::WinCondition, "Troop", 4),
                Card::new("Zap", CardRole::Spell, "Spell", 2),
                Card::new("Log", CardRole::Spell, "Spell", 2),
            ],
            Some(2.5),
        )
    }

    #[test]
    fn deck_lines_summary() {
        let lines = deck_lines(&deck(), &["Deck has only 3 cards".to_string()]);
        // 3 cards + avg + roles + 1 warning
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3].to_string(), " Avg elixir: 2.50  3/8 cards");
        assert_eq!(lines[4].to_string(), " Win Condition 1  Spell 2  ");
        assert_eq!(lines[5].to_string(), " ! Deck has only 3 cards");
    }

    #[test]
    fn unknown_average_shows_dash() {
        let deck = Deck::new(deck().cards, None);
        let lines = deck_lines(&deck, &[]);
        assert!(lines[3].to_string().contains("Avg elixir: \u{2014}"));
    }

    #[test]
    fn renders_placeholder_loading_and_error() {
        let mut state = ViewState::default();
        assert!(render_to_text(&state).contains("No deck yet."));
        state.deck_status = RequestStatus::Loading;
        assert!(render_to_text(&state).contains("Building deck..."));
        state.deck_status = RequestStatus::Error;
        state.deck_error = Some("Could not reach the server".to_string());
        assert!(render_to_text(&state).contains("Could not reach the server"));
    }

    #[test]
    fn renders_deck() {
        let state = ViewState {
            deck: Some(deck()),
            deck_status: RequestStatus::Complete,
            ..Default::default()
        };
        let text = render_to_text(&state);
        assert!(text.contains("Hog Rider"));
        assert!(text.contains("Avg elixir: 2.50"));
    }
}
