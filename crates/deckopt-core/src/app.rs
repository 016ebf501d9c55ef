// Application state and event loop.
//
// Receives user commands from the TUI and network completions from spawned
// request tasks, drives the selection and the orchestrator, and pushes UI
// updates to the TUI render loop. The loop is the only writer of state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::client::DeckApi;
use crate::config::Config;
use crate::orchestrator::{FlowError, Orchestrator, Settlement};
use crate::protocol::{
    AnalysisRequest, CustomDeckRequest, Flow, NetEvent, NetResult, UiUpdate, UserCommand,
};
use crate::selection::{AddOutcome, Selection};
use crate::telemetry::Telemetry;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
    pub selection: Selection,
    pub orchestrator: Orchestrator,
    /// Shared with spawned request tasks.
    pub api: Arc<dyn DeckApi>,
    /// Spawned request tasks report back through a clone of this sender.
    pub net_tx: mpsc::Sender<NetEvent>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Catalog,
        api: Arc<dyn DeckApi>,
        telemetry: Arc<dyn Telemetry>,
        net_tx: mpsc::Sender<NetEvent>,
    ) -> Self {
        AppState {
            config,
            catalog,
            selection: Selection::new(),
            orchestrator: Orchestrator::new(telemetry),
            api,
            net_tx,
        }
    }

    fn spawn_random(&self, generation: u64) {
        let api = Arc::clone(&self.api);
        let tx = self.net_tx.clone();
        tokio::spawn(async move {
            let result = NetResult::Random(api.generate_random().await);
            let _ = tx.send(NetEvent { generation, result }).await;
        });
    }

    fn spawn_custom(&self, generation: u64, request: CustomDeckRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.net_tx.clone();
        tokio::spawn(async move {
            let result = NetResult::Custom(api.complete_custom(&request).await);
            let _ = tx.send(NetEvent { generation, result }).await;
        });
    }

    fn spawn_analysis(&self, generation: u64, request: AnalysisRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.net_tx.clone();
        tokio::spawn(async move {
            let result = NetResult::Analysis(api.analyze(&request).await);
            let _ = tx.send(NetEvent { generation, result }).await;
        });
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop until `Quit` or the command channel closes.
///
/// Listens on two channels using `tokio::select!`:
/// 1. Completions from spawned network tasks
/// 2. User commands from the TUI
pub async fn run(
    mut net_rx: mpsc::Receiver<NetEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    // Stop polling a closed network channel so select! does not spin on it.
    let mut net_open = true;

    loop {
        tokio::select! {
            // --- Network completions ---
            event = net_rx.recv(), if net_open => {
                match event {
                    Some(event) => handle_net_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("Network channel closed");
                        net_open = false;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::AddCard(name) => {
            let Some(card) = state.catalog.find(&name).cloned() else {
                notice(ui_tx, format!("Unknown card: {name}")).await;
                return;
            };
            match state.selection.add(card) {
                AddOutcome::Added => {
                    debug!("Selected {} ({} total)", name, state.selection.len());
                    send_selection(state, ui_tx).await;
                }
                AddOutcome::Full => {
                    notice(ui_tx, "Selection is full: remove a card first".to_string()).await;
                }
                AddOutcome::Duplicate => {
                    notice(ui_tx, format!("{name} is already selected")).await;
                }
            }
        }
        UserCommand::RemoveCard(name) => {
            if state.selection.remove(&name) {
                send_selection(state, ui_tx).await;
            }
        }
        UserCommand::ClearSelection => {
            state.selection.clear();
            send_selection(state, ui_tx).await;
        }
        UserCommand::GenerateRandom => match state.orchestrator.begin_random() {
            Ok(ticket) => {
                state.spawn_random(ticket.generation);
                let _ = ui_tx.send(UiUpdate::DeckLoading(Flow::Random)).await;
            }
            Err(err) => notice(ui_tx, err.user_message(Flow::Random)).await,
        },
        UserCommand::CompleteDeck => match state.orchestrator.begin_custom(&state.selection) {
            Ok((ticket, request)) => {
                state.spawn_custom(ticket.generation, request);
                let _ = ui_tx.send(UiUpdate::DeckLoading(Flow::Custom)).await;
            }
            Err(err) => notice(ui_tx, err.user_message(Flow::Custom)).await,
        },
        UserCommand::Analyze(query) => match state.orchestrator.begin_analysis(&query) {
            Ok((ticket, request)) => {
                state.spawn_analysis(ticket.generation, request);
                let _ = ui_tx.send(UiUpdate::AnalysisStarted).await;
            }
            // While an analysis runs, its panel is left to that request.
            Err(err @ FlowError::Validation(_))
                if !state.orchestrator.analysis_phase().is_busy() =>
            {
                let _ = ui_tx
                    .send(UiUpdate::AnalysisFailed(err.user_message(Flow::Analysis)))
                    .await;
            }
            Err(err) => notice(ui_tx, err.user_message(Flow::Analysis)).await,
        },
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Feed a network completion to the orchestrator and forward what changed.
async fn handle_net_event(state: &mut AppState, event: NetEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    let Some(settlement) = state.orchestrator.complete(event.generation, event.result) else {
        return;
    };

    match settlement {
        Settlement::DeckReady {
            flow,
            deck,
            warnings,
        } => {
            info!(
                "{} deck ready: {} cards, avg {}",
                flow,
                deck.len(),
                deck.average_elixir_display()
            );
            let _ = ui_tx.send(UiUpdate::DeckReady { deck, warnings }).await;
            if flow == Flow::Custom && state.config.selection.clear_on_complete {
                state.selection.clear();
                send_selection(state, ui_tx).await;
            }
        }
        Settlement::DeckFailed { flow, error } => {
            let _ = ui_tx
                .send(UiUpdate::DeckFailed(error.user_message(flow)))
                .await;
        }
        Settlement::AnalysisReady(doc) => {
            let _ = ui_tx.send(UiUpdate::AnalysisReady(doc)).await;
        }
        Settlement::AnalysisFailed(error) => {
            let _ = ui_tx
                .send(UiUpdate::AnalysisFailed(error.user_message(Flow::Analysis)))
                .await;
        }
    }
}

async fn send_selection(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx
        .send(UiUpdate::SelectionChanged(state.selection.cards().to_vec()))
        .await;
}

async fn notice(ui_tx: &mpsc::Sender<UiUpdate>, message: String) {
    let _ = ui_tx.send(UiUpdate::Notice(message)).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, CardRole};
    use crate::client::ApiError;
    use crate::config::{CatalogConfig, SelectionConfig, ServerConfig};
    use crate::orchestrator::{CUSTOM_FAILURE, EMPTY_QUERY, RANDOM_FAILURE};
    use crate::protocol::{AnalysisResponse, CustomDeckResponse, RandomDeckResponse};
    use crate::telemetry::RecordingTelemetry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    const NAMES: [&str; 10] = [
        "Hog Rider", "Musketeer", "Fireball", "Zap", "Cannon", "Ice Spirit", "Skeletons",
        "Ice Golem", "Knight", "Archers",
    ];

    fn test_config(clear_on_complete: bool) -> Config {
        Config {
            server: ServerConfig {
                base_url: "http://127.0.0.1:1/api".to_string(),
                random_path: "/generate".to_string(),
                custom_path: "/generate/custom".to_string(),
                analyze_path: "/analyze".to_string(),
            },
            catalog: CatalogConfig {
                path: "data/cards.json".to_string(),
            },
            selection: SelectionConfig { clear_on_complete },
        }
    }

    fn test_catalog() -> Catalog {
        Catalog::new(
            NAMES
                .iter()
                .map(|n| Card::new(n, CardRole::Support, "Troop", 3))
                .collect(),
        )
    }

    fn eight_cards() -> Vec<Card> {
        test_catalog().cards()[..8].to_vec()
    }

    /// `DeckApi` whose calls block until `release` is notified.
    #[derive(Default)]
    struct GatedApi {
        release: Notify,
        calls: AtomicUsize,
        fail: bool,
    }

    impl GatedApi {
        async fn wait(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
        }
    }

    #[async_trait]
    impl DeckApi for GatedApi {
        async fn generate_random(&self) -> Result<RandomDeckResponse, ApiError> {
            self.wait().await;
            if self.fail {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            Ok(RandomDeckResponse {
                cards: Some(eight_cards()),
                average_elixir: Some(3.0),
            })
        }

        async fn complete_custom(
            &self,
            request: &CustomDeckRequest,
        ) -> Result<CustomDeckResponse, ApiError> {
            self.wait().await;
            if self.fail {
                return Err(ApiError::Status { status: 500 });
            }
            let mut deck = request.selected_cards.clone();
            deck.extend(eight_cards());
            Ok(CustomDeckResponse {
                deck: Some(deck),
                average_elixir: Some(3.1),
                warnings: Some(vec!["No building".to_string()]),
            })
        }

        async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResponse, ApiError> {
            self.wait().await;
            Ok(AnalysisResponse {
                status: Some("success".to_string()),
                analysis: Some("**Verdict**\nSolid.".to_string()),
                message: None,
            })
        }
    }

    struct Harness {
        cmd_tx: mpsc::Sender<UserCommand>,
        ui_rx: mpsc::Receiver<UiUpdate>,
        api: Arc<GatedApi>,
        handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    }

    fn start(api: GatedApi, clear_on_complete: bool) -> Harness {
        let api = Arc::new(api);
        let (net_tx, net_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, ui_rx) = mpsc::channel(64);
        let state = AppState::new(
            test_config(clear_on_complete),
            test_catalog(),
            api.clone(),
            Arc::new(RecordingTelemetry::new()),
            net_tx,
        );
        let handle = tokio::spawn(run(net_rx, cmd_rx, ui_tx, state));
        Harness {
            cmd_tx,
            ui_rx,
            api,
            handle,
        }
    }

    async fn next_update(rx: &mut mpsc::Receiver<UiUpdate>) -> UiUpdate {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for UiUpdate")
            .expect("ui channel closed")
    }

    async fn wait_for_calls(api: &GatedApi, n: usize) {
        for _ in 0..200 {
            if api.calls.load(Ordering::SeqCst) >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} api calls");
    }

    async fn quit(h: Harness) {
        h.cmd_tx.send(UserCommand::Quit).await.unwrap();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn add_remove_and_clear_selection() {
        let mut h = start(GatedApi::default(), false);

        h.cmd_tx.send(UserCommand::AddCard("Zap".into())).await.unwrap();
        match next_update(&mut h.ui_rx).await {
            UiUpdate::SelectionChanged(cards) => assert_eq!(cards[0].name, "Zap"),
            other => panic!("expected SelectionChanged, got {other:?}"),
        }

        h.cmd_tx.send(UserCommand::AddCard("Zap".into())).await.unwrap();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::Notice("Zap is already selected".to_string())
        );

        h.cmd_tx.send(UserCommand::AddCard("Mega Knight".into())).await.unwrap();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::Notice("Unknown card: Mega Knight".to_string())
        );

        h.cmd_tx.send(UserCommand::RemoveCard("Zap".into())).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::SelectionChanged(vec![]));

        h.cmd_tx.send(UserCommand::ClearSelection).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::SelectionChanged(vec![]));

        quit(h).await;
    }

    #[tokio::test]
    async fn ninth_card_is_refused() {
        let mut h = start(GatedApi::default(), false);
        for name in &NAMES[..9] {
            h.cmd_tx.send(UserCommand::AddCard(name.to_string())).await.unwrap();
        }
        for _ in 0..8 {
            assert!(matches!(
                next_update(&mut h.ui_rx).await,
                UiUpdate::SelectionChanged(_)
            ));
        }
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::Notice(_)));
        quit(h).await;
    }

    #[tokio::test]
    async fn double_generate_makes_one_network_call() {
        let mut h = start(GatedApi::default(), false);

        h.cmd_tx.send(UserCommand::GenerateRandom).await.unwrap();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::DeckLoading(Flow::Random)
        );
        wait_for_calls(&h.api, 1).await;

        h.cmd_tx.send(UserCommand::GenerateRandom).await.unwrap();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::Notice("A request is already in progress".to_string())
        );

        h.api.release.notify_one();
        match next_update(&mut h.ui_rx).await {
            UiUpdate::DeckReady { deck, warnings } => {
                assert_eq!(deck.len(), 8);
                assert!(warnings.is_empty());
            }
            other => panic!("expected DeckReady, got {other:?}"),
        }
        assert_eq!(h.api.calls.load(Ordering::SeqCst), 1);
        quit(h).await;
    }

    #[tokio::test]
    async fn random_failure_is_reported_with_flow_message() {
        let mut h = start(
            GatedApi {
                fail: true,
                ..Default::default()
            },
            false,
        );
        h.cmd_tx.send(UserCommand::GenerateRandom).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::DeckLoading(Flow::Random));
        wait_for_calls(&h.api, 1).await;
        h.api.release.notify_one();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::DeckFailed(RANDOM_FAILURE.to_string())
        );
        quit(h).await;
    }

    #[tokio::test]
    async fn custom_completion_dedupes_and_clears_when_configured() {
        let mut h = start(GatedApi::default(), true);
        h.cmd_tx.send(UserCommand::AddCard("Knight".into())).await.unwrap();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::SelectionChanged(_)));

        h.cmd_tx.send(UserCommand::CompleteDeck).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::DeckLoading(Flow::Custom));
        wait_for_calls(&h.api, 1).await;
        h.api.release.notify_one();

        match next_update(&mut h.ui_rx).await {
            UiUpdate::DeckReady { deck, warnings } => {
                // Knight plus the first eight catalog cards, capped at eight.
                assert_eq!(deck.len(), 8);
                assert_eq!(deck.cards[0].name, "Knight");
                assert_eq!(warnings, vec!["No building".to_string()]);
            }
            other => panic!("expected DeckReady, got {other:?}"),
        }
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::SelectionChanged(vec![]));
        quit(h).await;
    }

    #[tokio::test]
    async fn custom_failure_keeps_selection() {
        let mut h = start(
            GatedApi {
                fail: true,
                ..Default::default()
            },
            true,
        );
        h.cmd_tx.send(UserCommand::AddCard("Knight".into())).await.unwrap();
        next_update(&mut h.ui_rx).await;
        h.cmd_tx.send(UserCommand::CompleteDeck).await.unwrap();
        next_update(&mut h.ui_rx).await;
        wait_for_calls(&h.api, 1).await;
        h.api.release.notify_one();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::DeckFailed(CUSTOM_FAILURE.to_string())
        );

        // No SelectionChanged follows; the next update answers the next command.
        h.cmd_tx.send(UserCommand::AddCard("Knight".into())).await.unwrap();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::Notice("Knight is already selected".to_string())
        );
        quit(h).await;
    }

    #[tokio::test]
    async fn complete_with_empty_selection_is_a_notice() {
        let mut h = start(GatedApi::default(), false);
        h.cmd_tx.send(UserCommand::CompleteDeck).await.unwrap();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::Notice(_)));
        assert_eq!(h.api.calls.load(Ordering::SeqCst), 0);
        quit(h).await;
    }

    #[tokio::test]
    async fn analysis_round_trip() {
        let mut h = start(GatedApi::default(), false);

        h.cmd_tx.send(UserCommand::Analyze("  ".into())).await.unwrap();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::AnalysisFailed(EMPTY_QUERY.to_string())
        );

        h.cmd_tx.send(UserCommand::GenerateRandom).await.unwrap();
        next_update(&mut h.ui_rx).await;
        wait_for_calls(&h.api, 1).await;
        h.api.release.notify_one();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::DeckReady { .. }));

        h.cmd_tx.send(UserCommand::Analyze("Any weaknesses?".into())).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::AnalysisStarted);
        wait_for_calls(&h.api, 2).await;
        h.api.release.notify_one();
        match next_update(&mut h.ui_rx).await {
            UiUpdate::AnalysisReady(doc) => {
                assert_eq!(doc.sections[0].title.as_deref(), Some("Verdict"));
            }
            other => panic!("expected AnalysisReady, got {other:?}"),
        }
        quit(h).await;
    }

    #[tokio::test]
    async fn empty_question_during_analysis_is_a_notice() {
        let mut h = start(GatedApi::default(), false);
        h.cmd_tx.send(UserCommand::GenerateRandom).await.unwrap();
        next_update(&mut h.ui_rx).await;
        wait_for_calls(&h.api, 1).await;
        h.api.release.notify_one();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::DeckReady { .. }));

        h.cmd_tx.send(UserCommand::Analyze("Any weaknesses?".into())).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::AnalysisStarted);
        wait_for_calls(&h.api, 2).await;

        h.cmd_tx.send(UserCommand::Analyze(" ".into())).await.unwrap();
        assert_eq!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::Notice(EMPTY_QUERY.to_string())
        );

        h.api.release.notify_one();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::AnalysisReady(_)));
        quit(h).await;
    }

    #[tokio::test]
    async fn new_deck_drops_pending_analysis() {
        let mut h = start(GatedApi::default(), false);
        h.cmd_tx.send(UserCommand::GenerateRandom).await.unwrap();
        next_update(&mut h.ui_rx).await;
        wait_for_calls(&h.api, 1).await;
        h.api.release.notify_one();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::DeckReady { .. }));

        h.cmd_tx.send(UserCommand::Analyze("Any weaknesses?".into())).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::AnalysisStarted);
        wait_for_calls(&h.api, 2).await;

        h.cmd_tx.send(UserCommand::GenerateRandom).await.unwrap();
        assert_eq!(next_update(&mut h.ui_rx).await, UiUpdate::DeckLoading(Flow::Random));
        wait_for_calls(&h.api, 3).await;

        // Release both calls; only the deck reaches the UI.
        h.api.release.notify_one();
        h.api.release.notify_one();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::DeckReady { .. }));
        h.cmd_tx.send(UserCommand::AddCard("Zap".into())).await.unwrap();
        assert!(matches!(
            next_update(&mut h.ui_rx).await,
            UiUpdate::SelectionChanged(_)
        ));
        quit(h).await;
    }

    #[tokio::test]
    async fn command_channel_close_stops_loop() {
        let h = start(GatedApi::default(), false);
        drop(h.cmd_tx);
        let result = tokio::time::timeout(Duration::from_secs(5), h.handle)
            .await
            .expect("loop should exit");
        assert!(result.unwrap().is_ok());
    }
}
