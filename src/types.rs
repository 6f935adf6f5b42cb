//! Wire payloads exchanged between the bot and a front-end.
//!
//! Shapes match the original `/chat` JSON contract:
//! request `{"message": "..."}`, reply `{"response": "...", "cart": [...]}`
//! where `cart` is present only when the snapshot changed.

use serde::{Deserialize, Serialize};

/// One purchased unit in the cart. Multiple items may share a name,
/// each carrying its own price (promotions can change a price
/// mid-session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub price: f64,
}

/// A user message sent to the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// The bot's reply.
///
/// `cart` carries the full snapshot when the cart changed; when absent
/// the front-end keeps its current snapshot unchanged. There is no
/// incremental diffing — presence always means wholesale replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<LineItem>>,
}

impl ChatResponse {
    /// A reply that does not touch the cart.
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            cart: None,
        }
    }

    /// A reply carrying a replacement cart snapshot.
    pub fn with_cart(response: impl Into<String>, cart: Vec<LineItem>) -> Self {
        Self {
            response: response.into(),
            cart: Some(cart),
        }
    }
}
