//! Rule-based intent classification for Italian order messages.
//!
//! Produces the same structured output the original system expected
//! from its parser: a list of `{intent, items}` records, where items
//! carry a requested quantity. The types round-trip through serde so
//! an external parser emitting that JSON could feed the bot directly.

use serde::{Deserialize, Serialize};

use crate::menu::Menu;

/// Recognised user intentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AddToCart,
    Remove,
    Order,
    Menu,
    Checkout,
    Greet,
    Info,
    Track,
    Staff,
    Other,
}

/// An item mentioned in a message, resolved later against the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// One recognised intention with the items it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub intent: Intent,
    #[serde(default)]
    pub items: Vec<RequestedItem>,
}

/// Keyword tables per intent. Matching is substring-on-lowercase, the
/// same scheme the original rule KB used for its action keywords.
const REMOVE_KEYWORDS: &[&str] = &["togli", "rimuovi", "elimina", "cancella", "levami", "leva"];
const ADD_KEYWORDS: &[&str] = &[
    "vorrei", "voglio", "prendo", "prendiamo", "aggiungi", "ordino", "ordinare", "dammi",
    "portami", "anche",
];
const MENU_KEYWORDS: &[&str] = &["menu", "menù", "cosa avete", "lista", "carta"];
const CHECKOUT_KEYWORDS: &[&str] = &[
    "checkout", "concludi", "paghiamo", "pagare", "alla cassa", "chiudi l'ordine", "procedi",
];
const GREET_KEYWORDS: &[&str] = &["ciao", "salve", "buongiorno", "buonasera", "hey"];
const INFO_KEYWORDS: &[&str] = &[
    "orari", "indirizzo", "dove siete", "telefono", "contatti", "aperti", "informazioni",
];
const TRACK_KEYWORDS: &[&str] = &["mio ordine", "è pronto", "quando arriva", "stato dell'ordine"];
const STAFF_KEYWORDS: &[&str] = &["staff", "operatore", "umano", "una persona"];

/// Italian quantity words understood before an item name.
const QUANTIFIERS: &[(&str, u32)] = &[
    ("un", 1),
    ("una", 1),
    ("uno", 1),
    ("un'", 1),
    ("due", 2),
    ("tre", 3),
    ("quattro", 4),
    ("cinque", 5),
    ("sei", 6),
];

/// Classify a message into zero or more intents.
///
/// Cart-affecting intents come with the menu items mentioned in the
/// text; a bare list of items with no verb still counts as an add
/// (the "Order with items degrades to add_to_cart" rule). An empty
/// result means the message was not understood.
pub fn classify(text: &str, menu: &Menu) -> Vec<ParsedIntent> {
    let text_l = text.to_lowercase();
    let mut results = Vec::new();

    let items = extract_items(&text_l, menu);
    let wants_remove = contains_any(&text_l, REMOVE_KEYWORDS);
    let wants_add = contains_any(&text_l, ADD_KEYWORDS);

    if wants_remove && !items.is_empty() {
        results.push(ParsedIntent {
            intent: Intent::Remove,
            items: items.clone(),
        });
    } else if !items.is_empty() {
        results.push(ParsedIntent {
            intent: Intent::AddToCart,
            items,
        });
    } else if wants_add {
        // An order verb with nothing we recognise: pass the trailing
        // phrase through verbatim so the handler can say it is not on
        // the menu (name resolution happens there, not here).
        if let Some(candidate) = unknown_candidate(&text_l) {
            results.push(ParsedIntent {
                intent: Intent::AddToCart,
                items: vec![candidate],
            });
        }
    }

    for (keywords, intent) in [
        (MENU_KEYWORDS, Intent::Menu),
        (CHECKOUT_KEYWORDS, Intent::Checkout),
        (GREET_KEYWORDS, Intent::Greet),
        (INFO_KEYWORDS, Intent::Info),
        (TRACK_KEYWORDS, Intent::Track),
        (STAFF_KEYWORDS, Intent::Staff),
    ] {
        if contains_any(&text_l, keywords) {
            results.push(ParsedIntent {
                intent,
                items: Vec::new(),
            });
        }
    }

    results
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Scan the lowercased text for menu names and aliases; one requested
/// item per distinct menu item, quantity taken from the word right
/// before the first occurrence (default 1).
fn extract_items(text_l: &str, menu: &Menu) -> Vec<RequestedItem> {
    let mut found: Vec<(usize, RequestedItem)> = Vec::new();

    for item in menu.items() {
        let terms = std::iter::once(item.name.as_str()).chain(item.aliases.iter().map(String::as_str));
        // Longest term first so "coca cola" wins over "coca".
        let mut terms: Vec<&str> = terms.collect();
        terms.sort_by_key(|t| std::cmp::Reverse(t.len()));

        for term in terms {
            if let Some(pos) = text_l.find(&term.to_lowercase()) {
                let quantity = quantity_before(text_l, pos);
                found.push((
                    pos,
                    RequestedItem {
                        name: item.name.clone(),
                        quantity,
                    },
                ));
                break;
            }
        }
    }

    // Present items in the order they were mentioned.
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, item)| item).collect()
}

/// Filler words stripped from the front of an unrecognised phrase.
const FILLERS: &[&str] = &[
    "un", "una", "uno", "il", "lo", "la", "le", "i", "gli", "di", "per", "mi", "ti", "anche",
];

/// The phrase after the first order verb, with articles and
/// quantifiers stripped. `"vorrei un hamburger"` → `hamburger` x1.
fn unknown_candidate(text_l: &str) -> Option<RequestedItem> {
    let (pos, keyword) = ADD_KEYWORDS
        .iter()
        .filter_map(|k| text_l.find(k).map(|p| (p, *k)))
        .min()?;

    let mut quantity = 1;
    let mut words: Vec<&str> = text_l[pos + keyword.len()..]
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-'))
        .filter(|w| !w.is_empty())
        .collect();

    while let Some(first) = words.first() {
        if let Some((_, n)) = QUANTIFIERS.iter().find(|(word, _)| word == first) {
            quantity = *n;
            words.remove(0);
        } else if FILLERS.contains(first) {
            words.remove(0);
        } else {
            break;
        }
    }

    if words.is_empty() {
        return None;
    }
    Some(RequestedItem {
        name: words.join(" "),
        quantity,
    })
}

/// Quantity from the word immediately preceding byte offset `pos`.
fn quantity_before(text_l: &str, pos: usize) -> u32 {
    let Some(prev) = text_l[..pos].split_whitespace().last() else {
        return 1;
    };
    let prev = prev.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
    if let Ok(n) = prev.parse::<u32>() {
        return n.clamp(1, 99);
    }
    QUANTIFIERS
        .iter()
        .find(|(word, _)| *word == prev)
        .map(|(_, n)| *n)
        .unwrap_or(1)
}
