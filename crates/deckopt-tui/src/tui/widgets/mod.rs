// TUI widget modules for each dashboard panel.

pub mod analysis;
pub mod deck;
pub mod picker;
pub mod quit_confirm;
pub mod selection;
pub mod status_bar;

use ratatui::style::{Color, Modifier, Style};

/// Border style for a panel: cyan and bold when it has keyboard focus,
/// otherwise `base`.
pub fn focused_border_style(focused: bool, base: Style) -> Style {
    if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        base
    }
}
