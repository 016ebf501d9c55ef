// Library root for the terminal front end, exposed so the dashboard can be
// exercised from tests without a real terminal.

pub mod tui;
