// Name-based deduplication of server-returned card lists.

use std::collections::HashSet;

use crate::card::Card;

/// Output of [`dedupe`].
#[derive(Debug, Clone, PartialEq)]
pub struct Deduped {
    /// Cards in first-seen order, unique by name.
    pub unique: Vec<Card>,
    /// `input.len() - unique.len()`.
    pub removed_count: usize,
    /// Names of the discarded entries, one per removal.
    pub removed_names: Vec<String>,
}

/// Keep the first card seen for each name and drop every later occurrence.
///
/// The first occurrence wins even when a later duplicate carries different
/// metadata (e.g. a different elixir cost).
pub fn dedupe(cards: Vec<Card>) -> Deduped {
    let input_len = cards.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(input_len);
    let mut unique = Vec::with_capacity(input_len);
    let mut removed_names = Vec::new();

    for card in cards {
        if seen.insert(card.name.clone()) {
            unique.push(card);
        } else {
            removed_names.push(card.name);
        }
    }

    Deduped {
        removed_count: input_len - unique.len(),
        unique,
        removed_names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardRole;

    fn card(name: &str, cost: u32) -> Card {
        Card::new(name, CardRole::Support, "Troop", cost)
    }

    fn names(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn removes_repeats_keeping_first_seen_order() {
        let input = vec![card("A", 1), card("B", 2), card("A", 3), card("C", 4), card("B", 5)];
        let out = dedupe(input);
        assert_eq!(names(&out.unique), vec!["A", "B", "C"]);
        assert_eq!(out.removed_count, 2);
        assert_eq!(out.removed_names, vec!["A", "B"]);
    }

    #[test]
    fn first_occurrence_metadata_survives() {
        let out = dedupe(vec![card("Golem", 8), card("Golem", 3)]);
        assert_eq!(out.unique.len(), 1);
        assert_eq!(out.unique[0].elixir_cost, 8);
    }

    #[test]
    fn empty_input() {
        let out = dedupe(Vec::new());
        assert!(out.unique.is_empty());
        assert_eq!(out.removed_count, 0);
    }

    #[test]
    fn already_unique_is_unchanged() {
        let input = vec![card("A", 1), card("B", 2), card("C", 3)];
        let out = dedupe(input.clone());
        assert_eq!(out.unique, input);
        assert_eq!(out.removed_count, 0);
        assert!(out.removed_names.is_empty());
    }

    #[test]
    fn unique_is_subsequence_of_input() {
        let input: Vec<Card> = [3, 1, 3, 2, 1, 0, 2, 4, 4, 0]
            .iter()
            .map(|i| card(&format!("N{i}"), *i))
            .collect();
        let out = dedupe(input.clone());

        let mut it = input.iter();
        for kept in &out.unique {
            assert!(it.any(|c| c == kept), "{} out of order", kept.name);
        }
        assert_eq!(out.removed_count, input.len() - out.unique.len());
        assert_eq!(names(&out.unique), vec!["N3", "N1", "N2", "N0", "N4"]);
    }
}
