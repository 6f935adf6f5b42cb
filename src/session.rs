//! Per-conversation state, owned by whoever drives the bot.
//!
//! The original kept the cart in an implicit server-side session; here
//! the state is an explicit value passed into every bot call. The cart
//! snapshot is only ever replaced wholesale — there is no merging.

use crate::types::{ChatResponse, LineItem};

/// Where the conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationStep {
    #[default]
    Start,
    Ordering,
    Ordered,
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One line of conversation history.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// The last completed order, kept for tracking replies.
#[derive(Debug, Clone)]
pub struct LastOrder {
    pub number: String,
    pub eta: String,
    pub total: rust_decimal::Decimal,
}

/// Full conversation state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub step: ConversationStep,
    cart: Vec<LineItem>,
    history: Vec<HistoryEntry>,
    pub last_order: Option<LastOrder>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current cart snapshot.
    pub fn cart(&self) -> &[LineItem] {
        &self.cart
    }

    /// Replace the cart snapshot wholesale. This is the only way the
    /// cart changes; individual entries are never edited in place.
    pub fn replace_cart(&mut self, snapshot: Vec<LineItem>) {
        self.cart = snapshot;
    }

    /// Append `count` units of a menu item to the snapshot.
    pub fn add_items(&mut self, name: &str, price: f64, count: u32) {
        for _ in 0..count {
            self.cart.push(LineItem {
                name: name.to_string(),
                price,
            });
        }
    }

    /// Remove up to `count` items matching `name` (case-insensitive).
    /// Returns how many were actually removed.
    pub fn remove_items(&mut self, name: &str, count: u32) -> u32 {
        let mut removed = 0;
        self.cart.retain(|item| {
            if removed < count && item.name.eq_ignore_ascii_case(name) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Apply a bot response the way the front-end does: a present
    /// `cart` field replaces the snapshot, an absent one retains it.
    pub fn apply_response(&mut self, response: &ChatResponse) {
        if let Some(cart) = &response.cart {
            self.replace_cart(cart.clone());
        }
    }

    /// Record one line of conversation.
    pub fn push_history(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(HistoryEntry {
            role,
            content: content.into(),
        });
    }

    /// The most recent `window` history entries, oldest first.
    pub fn recent_history(&self, window: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatResponse;

    fn line(name: &str, price: f64) -> LineItem {
        LineItem {
            name: name.into(),
            price,
        }
    }

    #[test]
    fn test_present_cart_replaces_snapshot_wholesale() {
        let mut state = SessionState::new();
        state.replace_cart(vec![line("Diavola", 9.5), line("Diavola", 9.5)]);

        let reply = ChatResponse::with_cart("ok", vec![line("Margherita", 8.0)]);
        state.apply_response(&reply);

        assert_eq!(state.cart().len(), 1);
        assert_eq!(state.cart()[0].name, "Margherita");
    }

    #[test]
    fn test_absent_cart_retains_snapshot() {
        let mut state = SessionState::new();
        state.replace_cart(vec![line("Margherita", 8.0)]);

        state.apply_response(&ChatResponse::text("solo testo"));

        assert_eq!(state.cart().len(), 1);
    }

    #[test]
    fn test_remove_caps_at_requested_count() {
        let mut state = SessionState::new();
        state.add_items("Margherita", 8.0, 3);
        state.add_items("Coca-Cola", 2.5, 1);

        let removed = state.remove_items("margherita", 2);
        assert_eq!(removed, 2);
        assert_eq!(state.cart().len(), 2);

        // Removing more than present removes what is there.
        let removed = state.remove_items("Margherita", 5);
        assert_eq!(removed, 1);
        assert_eq!(state.cart().len(), 1);
        assert_eq!(state.cart()[0].name, "Coca-Cola");
    }

    #[test]
    fn test_recent_history_window() {
        let mut state = SessionState::new();
        for i in 0..10 {
            state.push_history(Role::User, format!("msg {i}"));
        }
        let recent = state.recent_history(6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].content, "msg 4");
        assert_eq!(recent[5].content, "msg 9");
    }
}
