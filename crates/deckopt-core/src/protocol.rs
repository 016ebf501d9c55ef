// Message types shared by the app loop, network tasks, and the TUI, plus
// the JSON bodies exchanged with the deck service.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::card::{Card, Deck};
use crate::client::ApiError;
use crate::formatter::AnalysisDocument;

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// The three request flows the orchestrator drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Random,
    Custom,
    Analysis,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Random => "random",
            Flow::Custom => "custom",
            Flow::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Wire types: requests
// ---------------------------------------------------------------------------

/// Body of the custom deck completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDeckRequest {
    pub selected_cards: Vec<Card>,
}

/// Body of the deck analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub deck: Vec<Card>,
    pub query: String,
}

// ---------------------------------------------------------------------------
// Wire types: responses
// ---------------------------------------------------------------------------
//
// Every field is optional so that a body missing a required field still
// decodes; the orchestrator decides which absences are malformed.

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomDeckResponse {
    pub cards: Option<Vec<Card>>,
    pub average_elixir: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDeckResponse {
    pub deck: Option<Vec<Card>>,
    pub average_elixir: Option<f64>,
    pub warnings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisResponse {
    pub status: Option<String>,
    pub analysis: Option<String>,
    pub message: Option<String>,
}

impl AnalysisResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

// ---------------------------------------------------------------------------
// Network task results
// ---------------------------------------------------------------------------

/// Outcome of one network call, by flow.
#[derive(Debug, Clone, PartialEq)]
pub enum NetResult {
    Random(Result<RandomDeckResponse, ApiError>),
    Custom(Result<CustomDeckResponse, ApiError>),
    Analysis(Result<AnalysisResponse, ApiError>),
}

impl NetResult {
    pub fn flow(&self) -> Flow {
        match self {
            NetResult::Random(_) => Flow::Random,
            NetResult::Custom(_) => Flow::Custom,
            NetResult::Analysis(_) => Flow::Analysis,
        }
    }
}

/// Sent by a spawned network task back to the app loop. `generation` is the
/// ticket the request was started with.
#[derive(Debug, Clone, PartialEq)]
pub struct NetEvent {
    pub generation: u64,
    pub result: NetResult,
}

// ---------------------------------------------------------------------------
// TUI <-> app loop
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the app loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    AddCard(String),
    RemoveCard(String),
    ClearSelection,
    GenerateRandom,
    CompleteDeck,
    Analyze(String),
    Quit,
}

/// State changes pushed from the app loop to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    SelectionChanged(Vec<Card>),
    /// A deck request was accepted; the previous deck is gone.
    DeckLoading(Flow),
    DeckReady {
        deck: Deck,
        warnings: Vec<String>,
    },
    DeckFailed(String),
    AnalysisStarted,
    AnalysisReady(AnalysisDocument),
    AnalysisFailed(String),
    /// Transient message for the status bar.
    Notice(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardRole;

    #[test]
    fn custom_request_serializes_selected_cards_key() {
        let req = CustomDeckRequest {
            selected_cards: vec![Card::new("Knight", CardRole::Defense, "Troop", 3)],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["selectedCards"][0]["name"], "Knight");
        assert_eq!(v["selectedCards"][0]["elixirCost"], 3);
    }

    #[test]
    fn analysis_request_shape() {
        let req = AnalysisRequest {
            deck: vec![Card::new("Zap", CardRole::Spell, "Spell", 2)],
            query: "How do I beat air?".to_string(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["deck"][0]["role"], "Spell");
        assert_eq!(v["query"], "How do I beat air?");
    }

    #[test]
    fn random_response_missing_fields_decode_as_none() {
        let resp: RandomDeckResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp, RandomDeckResponse::default());

        let resp: RandomDeckResponse =
            serde_json::from_str(r#"{"cards":[{"name":"Log"}],"averageElixir":2.0}"#).unwrap();
        assert_eq!(resp.cards.map(|c| c.len()), Some(1));
        assert_eq!(resp.average_elixir, Some(2.0));
    }

    #[test]
    fn custom_response_with_warnings() {
        let resp: CustomDeckResponse = serde_json::from_str(
            r#"{"deck":[],"averageElixir":null,"warnings":["No win condition"]}"#,
        )
        .unwrap();
        assert_eq!(resp.deck, Some(vec![]));
        assert_eq!(resp.average_elixir, None);
        assert_eq!(resp.warnings, Some(vec!["No win condition".to_string()]));
    }

    #[test]
    fn analysis_response_success_flag() {
        let ok: AnalysisResponse =
            serde_json::from_str(r#"{"status":"success","analysis":"**A**"}"#).unwrap();
        assert!(ok.is_success());
        let err: AnalysisResponse =
            serde_json::from_str(r#"{"status":"error","message":"Deck must have 8 cards"}"#)
                .unwrap();
        assert!(!err.is_success());
        assert_eq!(err.message.as_deref(), Some("Deck must have 8 cards"));
    }

    #[test]
    fn net_result_reports_its_flow() {
        assert_eq!(NetResult::Custom(Ok(Default::default())).flow(), Flow::Custom);
        assert_eq!(NetResult::Analysis(Ok(Default::default())).flow(), Flow::Analysis);
    }
}
