// Hand-picked card selection, capped at DECK_SIZE unique cards.

use crate::card::{Card, DECK_SIZE};

/// Result of [`Selection::add`]. The selection is only modified on `Added`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The selection already holds `DECK_SIZE` cards.
    Full,
    /// A card with the same name is already selected.
    Duplicate,
}

/// The user's in-progress picks. Ordered, unique by name, at most
/// [`DECK_SIZE`] entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    cards: Vec<Card>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, card: Card) -> AddOutcome {
        if self.is_full() {
            return AddOutcome::Full;
        }
        if self.contains(&card.name) {
            return AddOutcome::Duplicate;
        }
        self.cards.push(card);
        AddOutcome::Added
    }

    /// Remove the card with the given name. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.name != name);
        self.cards.len() != before
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cards.len() == DECK_SIZE
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.iter().any(|c| c.name == name)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn names(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.name.as_str()).collect()
    }
}
