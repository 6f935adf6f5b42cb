//! Menu catalogue: embedded data, markdown formatting, name lookup.
//!
//! The catalogue ships compiled into the binary (`menu.json`); an
//! external file can replace it at startup. Lookup tolerates typos and
//! aliases ("margarita", "coca") so the classifier can resolve what
//! users actually type.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::MarioError;

/// Similarity threshold below which a fuzzy candidate is rejected.
const MATCH_CUTOFF: f64 = 0.55;

/// One orderable product.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A menu section (Pizze, Bevande, Dolci).
#[derive(Debug, Clone, Deserialize)]
pub struct MenuSection {
    pub name: String,
    pub items: Vec<MenuItem>,
}

/// The full catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct Menu {
    pub sections: Vec<MenuSection>,
}

impl Menu {
    /// The compiled-in catalogue.
    pub fn embedded() -> Result<Self, MarioError> {
        Self::from_json(include_str!("../menu.json"))
    }

    /// Load a catalogue from an external JSON file.
    pub fn from_file(path: &Path) -> Result<Self, MarioError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn from_json(raw: &str) -> Result<Self, MarioError> {
        let menu: Menu = serde_json::from_str(raw)?;
        if menu.sections.iter().all(|s| s.items.is_empty()) {
            return Err(MarioError::MenuInvalid("no items in any section".into()));
        }
        Ok(menu)
    }

    /// All items across sections.
    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// Section name containing the given item, if any.
    pub fn section_of(&self, item_name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.items.iter().any(|i| i.name == item_name))
            .map(|s| s.name.as_str())
    }

    /// Section names present among the given item names, lowercased.
    /// Drives the upsell suggestion at order confirmation.
    pub fn sections_covered<'a>(
        &self,
        item_names: impl Iterator<Item = &'a str>,
    ) -> BTreeSet<String> {
        item_names
            .filter_map(|n| self.section_of(n))
            .map(|s| s.to_lowercase())
            .collect()
    }

    /// Find the closest matching item by name or alias.
    ///
    /// Exact and substring matches (case-insensitive) win outright;
    /// otherwise the highest-similarity candidate above the cutoff is
    /// returned. Queries shorter than two characters never match.
    pub fn best_match(&self, name: &str) -> Option<&MenuItem> {
        let query = name.trim().to_lowercase();
        if query.len() < 2 {
            return None;
        }

        let mut best: Option<(&MenuItem, f64)> = None;
        for item in self.items() {
            for term in std::iter::once(&item.name).chain(item.aliases.iter()) {
                let term_l = term.to_lowercase();
                if term_l == query || term_l.contains(&query) || query.contains(&term_l) {
                    return Some(item);
                }
                let score = similarity(&query, &term_l);
                if score >= MATCH_CUTOFF && best.map_or(true, |(_, s)| score > s) {
                    best = Some((item, score));
                }
            }
        }
        best.map(|(item, _)| item)
    }

    /// Markdown menu listing, one section per heading.
    pub fn formatted(&self, pizzeria_name: &str) -> String {
        let mut lines = vec![format!("# 📋 *Menu di {pizzeria_name}*")];

        for section in &self.sections {
            let emoji = section_emoji(&section.name);
            lines.push(format!("\n## {emoji} *{}*", section.name));
            for item in &section.items {
                lines.push(format!("- **{}** ─ €{:.2}", item.name, item.price));
            }
        }

        lines.push(
            "\n*Per ordinare, scrivi ad esempio:* _\"Una Margherita e una Coca-Cola\"_".into(),
        );
        lines.join("\n")
    }
}

fn section_emoji(section: &str) -> &'static str {
    match section {
        "Pizze" => "🍕",
        "Bevande" => "🥤",
        "Dolci" => "🍰",
        _ => "",
    }
}

/// Character-bigram Dice coefficient in `[0, 1]`.
///
/// Single-character strings compare by equality. Good enough to absorb
/// the typos lookup has to survive ("margerita", "tiramisu").
fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let mut a_grams = bigrams(a);
    let b_grams = bigrams(b);
    if a_grams.is_empty() || b_grams.is_empty() {
        return 0.0;
    }

    let total = a_grams.len() + b_grams.len();
    let mut matches = 0usize;
    for g in &b_grams {
        if let Some(pos) = a_grams.iter().position(|x| x == g) {
            a_grams.swap_remove(pos);
            matches += 1;
        }
    }
    (2 * matches) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Menu {
        Menu::embedded().unwrap()
    }

    #[test]
    fn test_embedded_menu_parses() {
        let m = menu();
        assert_eq!(m.sections.len(), 3);
        assert!(m.items().count() > 5);
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let m = menu();
        assert_eq!(m.best_match("margherita").unwrap().name, "Margherita");
        assert_eq!(m.best_match("DIAVOLA").unwrap().name, "Diavola");
    }

    #[test]
    fn test_alias_match() {
        let m = menu();
        assert_eq!(m.best_match("coca").unwrap().name, "Coca-Cola");
        assert_eq!(m.best_match("tiramisu").unwrap().name, "Tiramisù");
    }

    #[test]
    fn test_fuzzy_match_absorbs_typos() {
        let m = menu();
        assert_eq!(m.best_match("margerita").unwrap().name, "Margherita");
        assert_eq!(m.best_match("diavolla").unwrap().name, "Diavola");
    }

    #[test]
    fn test_short_or_unknown_queries_fail() {
        let m = menu();
        assert!(m.best_match("m").is_none());
        assert!(m.best_match("hamburger").is_none());
        assert!(m.best_match("").is_none());
    }

    #[test]
    fn test_section_of() {
        let m = menu();
        assert_eq!(m.section_of("Margherita"), Some("Pizze"));
        assert_eq!(m.section_of("Coca-Cola"), Some("Bevande"));
        assert_eq!(m.section_of("Sushi"), None);
    }

    #[test]
    fn test_sections_covered() {
        let m = menu();
        let covered = m.sections_covered(["Margherita", "Coca-Cola"].into_iter());
        assert!(covered.contains("pizze"));
        assert!(covered.contains("bevande"));
        assert!(!covered.contains("dolci"));
    }

    #[test]
    fn test_formatted_lists_prices() {
        let m = menu();
        let text = m.formatted("Pizzeria Da Mario");
        assert!(text.contains("# 📋 *Menu di Pizzeria Da Mario*"));
        assert!(text.contains("**Margherita** ─ €8.00"));
        assert!(text.contains("## 🥤 *Bevande*"));
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("pizza", "pizza"), 1.0);
        assert_eq!(similarity("ab", "cd"), 0.0);
        let s = similarity("margherita", "margerita");
        assert!(s > MATCH_CUTOFF && s < 1.0);
    }
}
