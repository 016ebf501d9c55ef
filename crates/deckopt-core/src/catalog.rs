// Static card catalog used for searching and filtering picks.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::card::{Card, CardRole};
use crate::selection::Selection;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("card catalog not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse card catalog {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Role filter offered by the card picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Only(CardRole),
}

impl RoleFilter {
    /// The filter sequence the picker cycles through: All, then each role.
    pub fn cycle(self) -> RoleFilter {
        match self {
            RoleFilter::All => RoleFilter::Only(CardRole::ALL[0]),
            RoleFilter::Only(role) => match CardRole::ALL.iter().position(|r| *r == role) {
                Some(i) if i + 1 < CardRole::ALL.len() => RoleFilter::Only(CardRole::ALL[i + 1]),
                _ => RoleFilter::All,
            },
        }
    }

    pub fn label(self) -> String {
        match self {
            RoleFilter::All => "All".to_string(),
            RoleFilter::Only(role) => role.label(),
        }
    }

    fn matches(self, card: &Card) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Only(role) => card.role == role,
        }
    }
}

/// Read-only list of every known card.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: Vec<Card>,
}

impl Catalog {
    /// Build a catalog from cards, dropping repeated names (first one wins).
    pub fn new(cards: Vec<Card>) -> Self {
        let deduped = crate::dedup::dedupe(cards);
        if deduped.removed_count > 0 {
            warn!(
                removed = deduped.removed_count,
                names = ?deduped.removed_names,
                "catalog contained duplicate card names"
            );
        }
        Catalog {
            cards: deduped.unique,
        }
    }

    /// Load the catalog from a JSON array of cards.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|_| CatalogError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        let cards: Vec<Card> =
            serde_json::from_str(&text).map_err(|e| CatalogError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        let catalog = Catalog::new(cards);
        info!("Loaded {} cards from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn find(&self, name: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.name == name)
    }

    /// Cards whose name contains `term` (case-insensitive), matching `filter`,
    /// and not already in `selection`. Catalog order is preserved.
    pub fn search(&self, term: &str, filter: RoleFilter, selection: &Selection) -> Vec<&Card> {
        let needle = term.trim().to_lowercase();
        self.cards
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .filter(|c| filter.matches(c))
            .filter(|c| !selection.contains(&c.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> Catalog {
        Catalog::new(vec![
            Card::new("Hog Rider", CardRole::WinCondition, "Troop", 4),
            Card::new("Zap", CardRole::Spell, "Spell", 2),
            Card::new("Fireball", CardRole::Spell, "Spell", 4),
            Card::new("Cannon", CardRole::Building, "Building", 3),
            Card::new("Musketeer", CardRole::Support, "Troop", 4),
        ])
    }

    fn names<'a>(cards: &[&'a Card]) -> Vec<&'a str> {
        cards.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let cat = sample();
        let found = cat.search("FIRE", RoleFilter::All, &Selection::new());
        assert_eq!(names(&found), vec!["Fireball"]);
    }

    #[test]
    fn search_filters_by_role() {
        let cat = sample();
        let found = cat.search("", RoleFilter::Only(CardRole::Spell), &Selection::new());
        assert_eq!(names(&found), vec!["Zap", "Fireball"]);
    }

    #[test]
    fn search_excludes_selected_cards() {
        let cat = sample();
        let mut sel = Selection::new();
        sel.add(Card::new("Zap", CardRole::Spell, "Spell", 2));
        let found = cat.search("", RoleFilter::All, &sel);
        assert!(!names(&found).contains(&"Zap"));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn duplicate_names_collapse_on_construction() {
        let cat = Catalog::new(vec![
            Card::new("Zap", CardRole::Spell, "Spell", 2),
            Card::new("Zap", CardRole::Spell, "Spell", 9),
        ]);
        assert_eq!(cat.len(), 1);
        assert_eq!(cat.find("Zap").map(|c| c.elixir_cost), Some(2));
    }

    #[test]
    fn role_filter_cycles_back_to_all() {
        let mut filter = RoleFilter::All;
        let mut seen = Vec::new();
        for _ in 0..=CardRole::ALL.len() {
            filter = filter.cycle();
            seen.push(filter);
        }
        assert_eq!(seen[0], RoleFilter::Only(CardRole::WinCondition));
        assert_eq!(*seen.last().unwrap(), RoleFilter::All);
    }

    #[test]
    fn load_from_json_file() {
        let tmp = std::env::temp_dir().join("deckopt_catalog_load");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("cards.json");
        fs::write(
            &path,
            r#"[{"name":"Knight","role":"Defense","type":"Troop","elixirCost":3,"rarity":"Common"},
                {"name":"Miner","role":"WinCondition","type":"Troop","elixirCost":3}]"#,
        )
        .unwrap();

        let cat = Catalog::load(&path).expect("should load catalog");
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.find("Miner").map(|c| c.role), Some(CardRole::WinCondition));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_missing_file_errors() {
        let path = std::env::temp_dir().join("deckopt_catalog_missing/cards.json");
        match Catalog::load(&path) {
            Err(CatalogError::FileNotFound { path: p }) => assert!(p.ends_with("cards.json")),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn load_invalid_json_errors() {
        let tmp = std::env::temp_dir().join("deckopt_catalog_invalid");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("cards.json");
        fs::write(&path, "{ not a list").unwrap();

        assert!(matches!(
            Catalog::load(&path),
            Err(CatalogError::ParseError { .. })
        ));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn shipped_catalog_is_clean() {
        let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
        let path = manifest.join("../../data/cards.json");
        let cat = Catalog::load(&path).expect("shipped catalog should load");
        assert_eq!(cat.len(), 30);
        assert!(cat.cards().iter().all(|c| c.role != CardRole::Unknown));
        assert!(cat.cards().iter().all(|c| c.rarity.is_some()));
        for role in CardRole::ALL {
            assert!(
                cat.cards().iter().any(|c| c.role == role),
                "no {role} cards in the shipped catalog"
            );
        }
    }
}
