// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the app loop has decided:
// the selection, the current deck and warnings, and the formatted analysis.
// The app loop pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::debug;

use deckopt_core::card::{Card, Deck};
use deckopt_core::catalog::{Catalog, RoleFilter};
use deckopt_core::formatter::AnalysisDocument;
use deckopt_core::protocol::{UiUpdate, UserCommand};
use deckopt_core::selection::Selection;

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Display status of a request panel (deck or analysis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Complete,
    Error,
}

/// Which panel receives cursor keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Picker,
    Selection,
    Analysis,
}

impl Focus {
    pub fn next(self) -> Focus {
        match self {
            Focus::Picker => Focus::Selection,
            Focus::Selection => Focus::Analysis,
            Focus::Analysis => Focus::Picker,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the app loop and by
/// local key handling (cursor, filters, text input).
#[derive(Debug, Default)]
pub struct ViewState {
    /// Full card list for the picker.
    pub catalog: Catalog,
    /// Mirror of the app's selection.
    pub selection: Selection,
    pub deck: Option<Deck>,
    pub warnings: Vec<String>,
    pub deck_status: RequestStatus,
    pub deck_error: Option<String>,
    pub analysis: Option<AnalysisDocument>,
    pub analysis_status: RequestStatus,
    pub analysis_error: Option<String>,
    /// Last transient message from the app loop.
    pub notice: Option<String>,
    pub focus: Focus,
    pub picker_cursor: usize,
    pub selection_cursor: usize,
    pub analysis_scroll: usize,
    /// Picker name search text.
    pub filter_text: String,
    /// Whether the picker search input is active.
    pub filter_mode: bool,
    pub role_filter: RoleFilter,
    /// Analysis question being typed.
    pub query_text: String,
    /// Whether the question input is active.
    pub query_mode: bool,
    pub confirm_quit: bool,
}

impl ViewState {
    pub fn new(catalog: Catalog) -> Self {
        ViewState {
            catalog,
            ..Default::default()
        }
    }

    /// Cards the picker currently shows: name search, role filter, and
    /// already-selected cards excluded.
    pub fn picker_cards(&self) -> Vec<&Card> {
        self.catalog
            .search(&self.filter_text, self.role_filter, &self.selection)
    }

    /// The picker card under the cursor, if any.
    pub fn highlighted_card(&self) -> Option<&Card> {
        self.picker_cards().get(self.picker_cursor).copied()
    }

    /// The selected card under the selection cursor, if any.
    pub fn highlighted_selected(&self) -> Option<&Card> {
        self.selection.cards().get(self.selection_cursor)
    }

    /// Keep both cursors inside their lists after the lists change.
    pub fn clamp_cursors(&mut self) {
        let picker_len = self.picker_cards().len();
        self.picker_cursor = self.picker_cursor.min(picker_len.saturating_sub(1));
        self.selection_cursor = self
            .selection_cursor
            .min(self.selection.len().saturating_sub(1));
    }

    fn set_selection(&mut self, cards: Vec<Card>) {
        let mut selection = Selection::new();
        for card in cards {
            selection.add(card);
        }
        self.selection = selection;
        self.clamp_cursors();
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::SelectionChanged(cards) => {
            state.set_selection(cards);
        }
        UiUpdate::DeckLoading(flow) => {
            debug!("deck request started ({})", flow);
            state.deck = None;
            state.warnings.clear();
            state.deck_error = None;
            state.deck_status = RequestStatus::Loading;
            state.notice = None;
            // Any analysis, pending or shown, was about the replaced deck.
            state.analysis = None;
            state.analysis_error = None;
            state.analysis_status = RequestStatus::Idle;
            state.analysis_scroll = 0;
        }
        UiUpdate::DeckReady { deck, warnings } => {
            state.deck = Some(deck);
            state.warnings = warnings;
            state.deck_error = None;
            state.deck_status = RequestStatus::Complete;
        }
        UiUpdate::DeckFailed(message) => {
            state.deck_error = Some(message);
            state.deck_status = RequestStatus::Error;
        }
        UiUpdate::AnalysisStarted => {
            state.analysis = None;
            state.analysis_error = None;
            state.analysis_status = RequestStatus::Loading;
            state.analysis_scroll = 0;
        }
        UiUpdate::AnalysisReady(doc) => {
            state.analysis = Some(doc);
            state.analysis_error = None;
            state.analysis_status = RequestStatus::Complete;
        }
        UiUpdate::AnalysisFailed(message) => {
            state.analysis_error = Some(message);
            state.analysis_status = RequestStatus::Error;
        }
        UiUpdate::Notice(message) => {
            state.notice = Some(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::picker::render(frame, layout.picker, state, state.focus == Focus::Picker);
    widgets::selection::render(
        frame,
        layout.selection,
        state,
        state.focus == Focus::Selection,
    );
    widgets::deck::render(frame, layout.deck, state);
    widgets::analysis::render(
        frame,
        layout.analysis,
        state,
        state.focus == Focus::Analysis,
    );
    widgets::analysis::render_query(frame, layout.query, state);
    render_help_bar(frame, &layout, state);

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area(), state);
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = if state.filter_mode {
        " Type to search | Enter:Keep | Esc:Clear"
    } else if state.query_mode {
        " Type your question | Enter:Analyze | Esc:Cancel"
    } else {
        " q:Quit | Tab:Focus | Enter:Add/Remove | /:Search | f:Role | r:Random | c:Complete | X:Clear | a:Ask"
    };
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    catalog: Catalog,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::new(catalog);
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app loop
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => break,
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
