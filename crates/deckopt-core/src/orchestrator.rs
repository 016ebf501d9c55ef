// Deck request orchestrator.
//
// Drives the random, custom, and analysis flows through an explicit state
// machine. Deck generation and analysis each have their own lane; a lane
// accepts one request at a time. Responses are tagged with the generation
// they were issued under and reconciled into the canonical deck, warnings,
// and analysis document. Accepting a deck request drops the analysis lane's
// state, pending or shown. The selection is read, never written.

use std::sync::Arc;

use thiserror::Error;

use crate::card::{Card, Deck, DECK_SIZE};
use crate::client::{ApiError, DeckApi};
use crate::dedup::dedupe;
use crate::formatter::{self, AnalysisDocument};
use crate::protocol::{
    AnalysisRequest, AnalysisResponse, CustomDeckRequest, CustomDeckResponse, Flow, NetResult,
    RandomDeckResponse,
};
use crate::selection::Selection;
use crate::telemetry::{FailureKind, Telemetry, TelemetryEvent};

// ---------------------------------------------------------------------------
// User-facing messages
// ---------------------------------------------------------------------------

pub const RANDOM_FAILURE: &str = "Failed to generate deck. Please try again.";
pub const CUSTOM_FAILURE: &str = "Failed to generate custom deck. Please try again.";
pub const ANALYSIS_FAILURE: &str = "Failed to connect to analysis service";
pub const ANALYSIS_FALLBACK: &str = "Failed to analyze deck";
pub const EMPTY_QUERY: &str = "Please enter a question about your deck";
pub const NO_DECK: &str = "Generate a deck before asking for an analysis";
pub const EMPTY_SELECTION: &str = "Select at least one card to complete a deck";

// ---------------------------------------------------------------------------
// State machine types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// Phase of one lane: `Idle -> Requesting -> Reconciling -> Settled`.
/// A settled lane accepts the next request as if idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Requesting(Flow),
    Reconciling(Flow),
    Settled(Outcome),
}

impl RequestPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, RequestPhase::Requesting(_) | RequestPhase::Reconciling(_))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} request rejected: another request is in flight")]
    Busy(Flow),

    #[error(transparent)]
    Network(ApiError),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("service reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Server(Option<String>),

    #[error("{0} response was superseded")]
    Superseded(Flow),
}

impl FlowError {
    /// The one string shown to the user for a failure in `flow`.
    pub fn user_message(&self, flow: Flow) -> String {
        match self {
            FlowError::Validation(msg) => msg.clone(),
            FlowError::Busy(_) => "A request is already in progress".to_string(),
            FlowError::Server(msg) => msg
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(ANALYSIS_FALLBACK)
                .to_string(),
            FlowError::Network(_) | FlowError::MalformedResponse(_) | FlowError::Superseded(_) => {
                match flow {
                    Flow::Random => RANDOM_FAILURE,
                    Flow::Custom => CUSTOM_FAILURE,
                    Flow::Analysis => ANALYSIS_FAILURE,
                }
                .to_string()
            }
        }
    }

    fn kind(&self) -> FailureKind {
        match self {
            FlowError::Validation(_) | FlowError::Busy(_) => FailureKind::Validation,
            FlowError::Network(_) | FlowError::Superseded(_) => FailureKind::Network,
            FlowError::MalformedResponse(_) => FailureKind::Malformed,
            FlowError::Server(_) => FailureKind::Server,
        }
    }
}

impl From<ApiError> for FlowError {
    fn from(err: ApiError) -> Self {
        if err.is_malformed() {
            FlowError::MalformedResponse(err.to_string())
        } else {
            FlowError::Network(err)
        }
    }
}

/// Handed out when a request is accepted. The response must be fed back to
/// [`Orchestrator::complete`] with the same generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub flow: Flow,
    pub generation: u64,
}

/// What a completed response changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    DeckReady {
        flow: Flow,
        deck: Deck,
        warnings: Vec<String>,
    },
    DeckFailed {
        flow: Flow,
        error: FlowError,
    },
    AnalysisReady(AnalysisDocument),
    AnalysisFailed(FlowError),
}

#[derive(Debug, Default)]
struct Lane {
    phase: RequestPhase,
    in_flight: Option<u64>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    deck_lane: Lane,
    analysis_lane: Lane,
    generation: u64,
    deck: Option<Deck>,
    warnings: Vec<String>,
    deck_error: Option<String>,
    analysis: Option<AnalysisDocument>,
    analysis_error: Option<String>,
    telemetry: Arc<dyn Telemetry>,
}

impl Orchestrator {
    pub fn new(telemetry: Arc<dyn Telemetry>) -> Self {
        Orchestrator {
            deck_lane: Lane::default(),
            analysis_lane: Lane::default(),
            generation: 0,
            deck: None,
            warnings: Vec::new(),
            deck_error: None,
            analysis: None,
            analysis_error: None,
            telemetry,
        }
    }

    // ---- Read access ----

    pub fn deck_phase(&self) -> RequestPhase {
        self.deck_lane.phase
    }

    pub fn analysis_phase(&self) -> RequestPhase {
        self.analysis_lane.phase
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn deck_error(&self) -> Option<&str> {
        self.deck_error.as_deref()
    }

    pub fn analysis(&self) -> Option<&AnalysisDocument> {
        self.analysis.as_ref()
    }

    pub fn analysis_error(&self) -> Option<&str> {
        self.analysis_error.as_deref()
    }

    // ---- Starting requests ----

    pub fn begin_random(&mut self) -> Result<Ticket, FlowError> {
        self.accept_deck(Flow::Random)
    }

    /// Start a custom completion carrying the selection's cards in order.
    pub fn begin_custom(
        &mut self,
        selection: &Selection,
    ) -> Result<(Ticket, CustomDeckRequest), FlowError> {
        if selection.is_empty() {
            return Err(self.invalid(Flow::Custom, EMPTY_SELECTION));
        }
        let ticket = self.accept_deck(Flow::Custom)?;
        let request = CustomDeckRequest {
            selected_cards: selection.cards().to_vec(),
        };
        Ok((ticket, request))
    }

    /// Start an analysis of the current deck. The query is sent as typed but
    /// must contain something other than whitespace.
    pub fn begin_analysis(
        &mut self,
        query: &str,
    ) -> Result<(Ticket, AnalysisRequest), FlowError> {
        let busy = self.analysis_lane.phase.is_busy();
        if query.trim().is_empty() {
            return Err(self.reject_analysis(EMPTY_QUERY, busy));
        }
        let Some(deck_cards) = self.deck.as_ref().map(|d| d.cards.clone()) else {
            return Err(self.reject_analysis(NO_DECK, busy));
        };
        if busy {
            return Err(self.busy(Flow::Analysis));
        }

        let generation = self.next_generation();
        self.analysis_lane.phase = RequestPhase::Requesting(Flow::Analysis);
        self.analysis_lane.in_flight = Some(generation);
        self.analysis = None;
        self.analysis_error = None;
        self.telemetry.record(TelemetryEvent::RequestAccepted {
            flow: Flow::Analysis,
            generation,
        });

        let ticket = Ticket {
            flow: Flow::Analysis,
            generation,
        };
        let request = AnalysisRequest {
            deck: deck_cards,
            query: query.to_string(),
        };
        Ok((ticket, request))
    }

    /// Return the lane serving `flow` to `Idle`. Any response still in flight
    /// for it will be discarded as stale when it arrives.
    pub fn reset(&mut self, flow: Flow) {
        let lane = self.lane_mut(flow);
        lane.phase = RequestPhase::Idle;
        lane.in_flight = None;
    }

    // ---- Completing requests ----

    /// Apply a network result. Returns `None` when the result is stale.
    pub fn complete(&mut self, generation: u64, result: NetResult) -> Option<Settlement> {
        let flow = result.flow();
        let (phase, current) = {
            let lane = self.lane_mut(flow);
            (lane.phase, lane.in_flight)
        };
        if current != Some(generation) || phase != RequestPhase::Requesting(flow) {
            self.telemetry.record(TelemetryEvent::StaleResponseDiscarded {
                flow,
                generation,
                current,
            });
            return None;
        }
        let lane = self.lane_mut(flow);
        lane.phase = RequestPhase::Reconciling(flow);
        lane.in_flight = None;

        let settlement = match result {
            NetResult::Random(response) => {
                let reconciled = response
                    .map_err(FlowError::from)
                    .and_then(|r| self.reconcile_random(r));
                self.settle_deck(Flow::Random, reconciled)
            }
            NetResult::Custom(response) => {
                let reconciled = response
                    .map_err(FlowError::from)
                    .and_then(|r| self.reconcile_custom(r));
                self.settle_deck(Flow::Custom, reconciled)
            }
            NetResult::Analysis(response) => {
                let reconciled = response
                    .map_err(FlowError::from)
                    .and_then(reconcile_analysis);
                self.settle_analysis(reconciled)
            }
        };

        let outcome = match &settlement {
            Settlement::DeckReady { .. } | Settlement::AnalysisReady(_) => Outcome::Success,
            Settlement::DeckFailed { .. } | Settlement::AnalysisFailed(_) => Outcome::Failed,
        };
        if outcome == Outcome::Success {
            self.telemetry
                .record(TelemetryEvent::FlowSucceeded { flow, generation });
        }
        self.lane_mut(flow).phase = RequestPhase::Settled(outcome);
        Some(settlement)
    }

    // ---- Async convenience wrappers ----

    /// Run a random deck request to completion against `api`.
    pub async fn generate_random(&mut self, api: &dyn DeckApi) -> Result<Deck, FlowError> {
        let ticket = self.begin_random()?;
        let result = NetResult::Random(api.generate_random().await);
        deck_result(Flow::Random, self.complete(ticket.generation, result))
    }

    /// Run a custom completion of `selection` to completion against `api`.
    pub async fn complete_custom(
        &mut self,
        api: &dyn DeckApi,
        selection: &Selection,
    ) -> Result<Deck, FlowError> {
        let (ticket, request) = self.begin_custom(selection)?;
        let result = NetResult::Custom(api.complete_custom(&request).await);
        deck_result(Flow::Custom, self.complete(ticket.generation, result))
    }

    /// Run an analysis of the current deck to completion against `api`.
    pub async fn analyze(
        &mut self,
        api: &dyn DeckApi,
        query: &str,
    ) -> Result<AnalysisDocument, FlowError> {
        let (ticket, request) = self.begin_analysis(query)?;
        let result = NetResult::Analysis(api.analyze(&request).await);
        match self.complete(ticket.generation, result) {
            Some(Settlement::AnalysisReady(doc)) => Ok(doc),
            Some(Settlement::AnalysisFailed(error)) => Err(error),
            _ => Err(FlowError::Superseded(Flow::Analysis)),
        }
    }

    // ---- Internals ----

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn lane_mut(&mut self, flow: Flow) -> &mut Lane {
        match flow {
            Flow::Random | Flow::Custom => &mut self.deck_lane,
            Flow::Analysis => &mut self.analysis_lane,
        }
    }

    fn accept_deck(&mut self, flow: Flow) -> Result<Ticket, FlowError> {
        if self.deck_lane.phase.is_busy() {
            return Err(self.busy(flow));
        }
        let generation = self.next_generation();
        self.deck_lane.phase = RequestPhase::Requesting(flow);
        self.deck_lane.in_flight = Some(generation);
        self.deck = None;
        self.warnings.clear();
        self.deck_error = None;
        // Any analysis shown or pending describes the deck being replaced.
        self.analysis = None;
        self.analysis_error = None;
        if self.analysis_lane.phase.is_busy() {
            self.reset(Flow::Analysis);
        }
        self.telemetry
            .record(TelemetryEvent::RequestAccepted { flow, generation });
        Ok(Ticket { flow, generation })
    }

    /// Validation failure for an analysis. While one is running its panel
    /// is left alone.
    fn reject_analysis(&mut self, message: &str, busy: bool) -> FlowError {
        if !busy {
            self.analysis_error = Some(message.to_string());
        }
        self.invalid(Flow::Analysis, message)
    }

    fn busy(&self, flow: Flow) -> FlowError {
        self.telemetry.record(TelemetryEvent::RequestRejected { flow });
        FlowError::Busy(flow)
    }

    fn invalid(&self, flow: Flow, message: &str) -> FlowError {
        let error = FlowError::Validation(message.to_string());
        self.record_failure(flow, &error);
        error
    }

    fn record_failure(&self, flow: Flow, error: &FlowError) {
        self.telemetry.record(TelemetryEvent::FlowFailed {
            flow,
            kind: error.kind(),
            detail: error.to_string(),
        });
    }

    fn reconcile_random(
        &self,
        response: RandomDeckResponse,
    ) -> Result<(Deck, Vec<String>), FlowError> {
        let cards = response
            .cards
            .ok_or_else(|| FlowError::MalformedResponse("missing `cards`".to_string()))?;
        let deck = self.build_deck(Flow::Random, cards, response.average_elixir);
        Ok((deck, Vec::new()))
    }

    fn reconcile_custom(
        &self,
        response: CustomDeckResponse,
    ) -> Result<(Deck, Vec<String>), FlowError> {
        let cards = response
            .deck
            .ok_or_else(|| FlowError::MalformedResponse("missing `deck`".to_string()))?;
        let average = response.average_elixir.unwrap_or(0.0);
        let deck = self.build_deck(Flow::Custom, cards, Some(average));
        let warnings = response
            .warnings
            .filter(|w| !w.is_empty())
            .unwrap_or_default();
        Ok((deck, warnings))
    }

    /// Dedupe and cap the server's cards, recording anything unusual.
    fn build_deck(&self, flow: Flow, cards: Vec<Card>, average: Option<f64>) -> Deck {
        let received = cards.len();
        let mut deduped = dedupe(cards);
        if deduped.removed_count > 0 {
            self.telemetry.record(TelemetryEvent::DuplicatesRemoved {
                flow,
                removed: deduped.removed_count,
                names: deduped.removed_names,
            });
        }
        let unique = deduped.unique.len();
        if received != DECK_SIZE || unique != DECK_SIZE {
            self.telemetry.record(TelemetryEvent::IncompleteDeck {
                flow,
                received,
                unique,
            });
        }
        deduped.unique.truncate(DECK_SIZE);
        Deck::new(deduped.unique, average)
    }

    fn settle_deck(
        &mut self,
        flow: Flow,
        reconciled: Result<(Deck, Vec<String>), FlowError>,
    ) -> Settlement {
        match reconciled {
            Ok((deck, warnings)) => {
                self.deck = Some(deck.clone());
                self.warnings = warnings.clone();
                self.deck_error = None;
                Settlement::DeckReady {
                    flow,
                    deck,
                    warnings,
                }
            }
            Err(error) => {
                self.record_failure(flow, &error);
                self.deck_error = Some(error.user_message(flow));
                Settlement::DeckFailed { flow, error }
            }
        }
    }

    fn settle_analysis(&mut self, reconciled: Result<AnalysisDocument, FlowError>) -> Settlement {
        match reconciled {
            Ok(doc) => {
                self.analysis = Some(doc.clone());
                self.analysis_error = None;
                Settlement::AnalysisReady(doc)
            }
            Err(error) => {
                self.record_failure(Flow::Analysis, &error);
                self.analysis_error = Some(error.user_message(Flow::Analysis));
                Settlement::AnalysisFailed(error)
            }
        }
    }
}

fn reconcile_analysis(response: AnalysisResponse) -> Result<AnalysisDocument, FlowError> {
    if !response.is_success() {
        return Err(FlowError::Server(response.message));
    }
    let text = response
        .analysis
        .ok_or_else(|| FlowError::MalformedResponse("missing `analysis`".to_string()))?;
    Ok(formatter::format(&text))
}

fn deck_result(flow: Flow, settlement: Option<Settlement>) -> Result<Deck, FlowError> {
    match settlement {
        Some(Settlement::DeckReady { deck, .. }) => Ok(deck),
        Some(Settlement::DeckFailed { error, .. }) => Err(error),
        _ => Err(FlowError::Superseded(flow)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
