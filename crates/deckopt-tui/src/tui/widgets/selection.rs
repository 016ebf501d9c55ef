// Selection widget: the cards chosen for a custom deck, in pick order.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use deckopt_core::card::{Card, DECK_SIZE};

use super::focused_border_style;
use super::picker::role_color;
use crate::tui::ViewState;

/// Render the selection list into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, focused: bool) {
    let selected = state.selection.cards();
    let title_style = if state.selection.is_full() {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!("Selection ({}/{})", selected.len(), DECK_SIZE),
            title_style,
        ))
        .border_style(focused_border_style(focused, Style::default()));

    if selected.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from("  No cards selected."),
            Line::from("  Enter adds a card, c completes"),
            Line::from("  the deck from your picks."),
        ])
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = selected
        .iter()
        .enumerate()
        .map(|(i, card)| format_card(i, card))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut list_state = ListState::default();
    if focused {
        list_state.select(Some(state.selection_cursor));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn format_card(index: usize, card: &Card) -> ListItem<'static> {
    ListItem::new(Line::from(vec![
        Span::styled(format!(" {}. ", index + 1), Style::default().fg(Color::DarkGray)),
        Span::raw(card.name.clone()),
        Span::styled(
            format!(" ({})", card.elixir_cost),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!(" {}", card.role.label()),
            Style::default().fg(role_color(card.role)),
        ),
    ]))
}
