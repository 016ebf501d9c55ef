// Card and deck model shared by the catalog, selection, and orchestrator.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Number of cards in a complete deck.
pub const DECK_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// CardRole
// ---------------------------------------------------------------------------

/// Tactical role of a card. Unrecognized role strings map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardRole {
    WinCondition,
    Support,
    Spell,
    Defense,
    Building,
    #[default]
    Unknown,
}

impl CardRole {
    /// All concrete roles, in the order the picker offers them as filters.
    pub const ALL: [CardRole; 5] = [
        CardRole::WinCondition,
        CardRole::Support,
        CardRole::Spell,
        CardRole::Defense,
        CardRole::Building,
    ];

    /// Wire name of the role (e.g. `"WinCondition"`).
    pub fn as_str(self) -> &'static str {
        match self {
            CardRole::WinCondition => "WinCondition",
            CardRole::Support => "Support",
            CardRole::Spell => "Spell",
            CardRole::Defense => "Defense",
            CardRole::Building => "Building",
            CardRole::Unknown => "Unknown",
        }
    }

    /// Human-readable label: `WinCondition` becomes `Win Condition`.
    pub fn label(self) -> String {
        let mut out = String::new();
        for (i, ch) in self.as_str().chars().enumerate() {
            if i > 0 && ch.is_ascii_uppercase() {
                out.push(' ');
            }
            out.push(ch);
        }
        out
    }
}

impl From<&str> for CardRole {
    fn from(s: &str) -> Self {
        match s.trim() {
            "WinCondition" => CardRole::WinCondition,
            "Support" => CardRole::Support,
            "Spell" => CardRole::Spell,
            "Defense" => CardRole::Defense,
            "Building" => CardRole::Building,
            _ => CardRole::Unknown,
        }
    }
}

impl From<String> for CardRole {
    fn from(s: String) -> Self {
        CardRole::from(s.as_str())
    }
}

impl From<CardRole> for String {
    fn from(role: CardRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for CardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single card as known to the catalog and exchanged with the server.
///
/// Every field tolerates being absent or `null` on the wire; missing values
/// fall back to their defaults instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Card {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub role: CardRole,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub card_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub elixir_cost: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
}

impl Card {
    pub fn new(name: &str, role: CardRole, card_type: &str, elixir_cost: u32) -> Self {
        Card {
            name: name.to_string(),
            role,
            card_type: card_type.to_string(),
            elixir_cost,
            rarity: None,
        }
    }

    /// Rarity for display, defaulting to `Common` when the server omits it.
    pub fn rarity_or_default(&self) -> &str {
        self.rarity.as_deref().unwrap_or("Common")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

/// The canonical, displayed deck.
///
/// Only the orchestrator builds one, from a reconciled server response.
/// `average_elixir` is `None` when the server value is missing or not a
/// finite non-negative number.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub cards: Vec<Card>,
    pub average_elixir: Option<f64>,
}

impl Deck {
    pub fn new(cards: Vec<Card>, average_elixir: Option<f64>) -> Self {
        Deck {
            cards,
            average_elixir: average_elixir.filter(|v| v.is_finite() && *v >= 0.0),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// True when the deck holds exactly [`DECK_SIZE`] cards.
    pub fn is_complete(&self) -> bool {
        self.cards.len() == DECK_SIZE
    }

    /// Average elixir with two decimals, or an em dash when unknown.
    pub fn average_elixir_display(&self) -> String {
        match self.average_elixir {
            Some(avg) => format!("{avg:.2}"),
            None => "\u{2014}".to_string(),
        }
    }

    /// Number of cards per role, in the order each role first appears.
    pub fn role_breakdown(&self) -> Vec<(CardRole, usize)> {
        let mut counts: Vec<(CardRole, usize)> = Vec::new();
        for card in &self.cards {
            match counts.iter_mut().find(|(role, _)| *role == card.role) {
                Some((_, n)) => *n += 1,
                None => counts.push((card.role, 1)),
            }
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
