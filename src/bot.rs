//! Mario, the ordering assistant.
//!
//! Takes one user message plus the session state and produces a typed
//! [`ChatResponse`]. Intents are bucketed so a single message can add,
//! remove, and ask for the menu at once; the cart snapshot is attached
//! to the reply only when it changed.

use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, info};

use crate::config::{BotConfig, PizzeriaInfo};
use crate::intent::{self, Intent, ParsedIntent};
use crate::menu::Menu;
use crate::order;
use crate::orderlog::OrderLog;
use crate::session::{ConversationStep, Role, SessionState};
use crate::types::{ChatRequest, ChatResponse};

/// Identifier written to the order audit log.
const USER_ID: &str = "local_user";

pub struct MarioBot {
    menu: Menu,
    info: PizzeriaInfo,
    config: BotConfig,
    log: OrderLog,
}

/// Intents grouped the way the handler consumes them.
#[derive(Debug, Default)]
struct IntentBucket {
    adds: Vec<(String, u32)>,
    removes: Vec<(String, u32)>,
    others: Vec<Intent>,
}

/// Short confirmations accepted after the checkout question.
fn is_affirmation(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "sì" | "si" | "yes" | "ok" | "va bene" | "confermo" | "certo"
    )
}

/// Combine parsed intents: add/remove items merged per name, the rest
/// deduplicated in arrival order.
fn bucket_intents(parsed: Vec<ParsedIntent>) -> IntentBucket {
    let mut bucket = IntentBucket::default();
    let mut add_counts: HashMap<String, u32> = HashMap::new();
    let mut add_order: Vec<String> = Vec::new();

    for action in parsed {
        match action.intent {
            Intent::AddToCart | Intent::Order => {
                for item in action.items {
                    if !add_counts.contains_key(&item.name) {
                        add_order.push(item.name.clone());
                    }
                    *add_counts.entry(item.name).or_insert(0) += item.quantity;
                }
            }
            Intent::Remove => {
                for item in action.items {
                    bucket.removes.push((item.name, item.quantity));
                }
            }
            other => {
                if !bucket.others.contains(&other) {
                    bucket.others.push(other);
                }
            }
        }
    }

    bucket.adds = add_order
        .into_iter()
        .map(|name| {
            let count = add_counts[&name];
            (name, count)
        })
        .collect();
    bucket
}

impl MarioBot {
    pub fn new(menu: Menu, info: PizzeriaInfo, config: BotConfig, log: OrderLog) -> Self {
        Self {
            menu,
            info,
            config,
            log,
        }
    }

    pub fn info(&self) -> &PizzeriaInfo {
        &self.info
    }

    /// Handle a typed wire request (the `{"message": ...}` payload).
    pub fn handle_request(&self, state: &mut SessionState, request: &ChatRequest) -> ChatResponse {
        self.handle(state, &request.message)
    }

    /// Handle one user message.
    pub fn handle(&self, state: &mut SessionState, text: &str) -> ChatResponse {
        self.handle_with_rng(state, text, &mut rand::thread_rng())
    }

    /// Same as [`handle`], with a caller-supplied RNG (seedable in
    /// tests; drives order numbers, ETAs, and upsell choices).
    ///
    /// [`handle`]: Self::handle
    pub fn handle_with_rng(
        &self,
        state: &mut SessionState,
        text: &str,
        rng: &mut impl Rng,
    ) -> ChatResponse {
        let is_welcome = text == "!welcome";
        if !is_welcome {
            state.push_history(Role::User, text);
        }

        if is_welcome || state.step == ConversationStep::Start {
            state.step = ConversationStep::Ordering;
            let greeting = format!(
                "👋 Benvenuto in *{}*! Vuoi vedere il menu o ordinare subito? La Diavola oggi è 🔥",
                self.info.name
            );
            state.push_history(Role::Assistant, greeting.clone());
            return ChatResponse::text(greeting);
        }

        let mut parsed = intent::classify(text, &self.menu);
        debug!(message = %text, intents = parsed.len(), "classified");

        // A bare "sì" right after the checkout question continues the
        // order instead of falling through to "not understood".
        if parsed.is_empty() && is_affirmation(text) && self.checkout_was_offered(state) {
            parsed = vec![ParsedIntent {
                intent: Intent::Checkout,
                items: Vec::new(),
            }];
        }

        if parsed.is_empty() {
            let reply = "Non ho capito bene. Vuoi vedere il menu, ordinare o controllare un ordine?";
            state.push_history(Role::Assistant, reply);
            return ChatResponse::text(reply);
        }

        let bucket = bucket_intents(parsed);
        let mut responses: Vec<String> = Vec::new();
        let mut cart_changed = false;

        // Adds first, resolved against the menu.
        let mut added: Vec<(String, u32)> = Vec::new();
        for (name, quantity) in &bucket.adds {
            match self.menu.best_match(name) {
                Some(item) => {
                    state.add_items(&item.name, item.price, *quantity);
                    added.push((item.name.clone(), *quantity));
                    cart_changed = true;
                }
                None => responses.push(format!(
                    "'{name}' non è nel nostro menu. Vuoi che ti mostri le opzioni?"
                )),
            }
        }

        // Then removes.
        let mut removed: Vec<String> = Vec::new();
        for (name, quantity) in &bucket.removes {
            let resolved = self
                .menu
                .best_match(name)
                .map(|item| item.name.clone())
                .unwrap_or_else(|| name.clone());
            if state.remove_items(&resolved, *quantity) > 0 {
                removed.push(resolved);
                cart_changed = true;
            }
        }

        if !added.is_empty() {
            responses.push(order::confirmation_message(state, &self.menu, &added, rng));
        }
        if !removed.is_empty() {
            responses.push(self.removal_summary(state, &removed));
        }

        for other in &bucket.others {
            match other {
                Intent::Menu => responses.push(self.menu.formatted(&self.info.name)),
                Intent::Greet | Intent::Info => responses.push(self.info_reply()),
                Intent::Track => responses.push(self.track_reply(state)),
                Intent::Staff => responses.push(
                    "Ti metto in contatto con lo staff... scherzo! Sono ancora io. Dimmi pure."
                        .into(),
                ),
                Intent::Checkout => {
                    let (summary, record) = order::checkout(state, &self.info, &self.config, rng);
                    if let Some(record) = record {
                        info!(order = %record.number, items = record.total_items, "order placed");
                        self.log.record(USER_ID, &record);
                        cart_changed = true;
                    }
                    responses.push(summary);
                }
                Intent::Other => responses.push(
                    "Non ho capito bene. Vuoi vedere il menu, ordinare o controllare un ordine?"
                        .into(),
                ),
                Intent::AddToCart | Intent::Order | Intent::Remove => {}
            }
        }

        if responses.is_empty() {
            responses
                .push("Dimmi pure cosa vuoi ordinare, o scrivi 'menu' per vedere le opzioni.".into());
        }

        let reply = responses.join("\n\n");
        state.push_history(Role::Assistant, reply.clone());

        if cart_changed {
            ChatResponse::with_cart(reply, state.cart().to_vec())
        } else {
            ChatResponse::text(reply)
        }
    }

    /// Whether the latest assistant message within the history window
    /// ended on the add-more-or-checkout question.
    fn checkout_was_offered(&self, state: &SessionState) -> bool {
        state
            .recent_history(self.config.history_window)
            .iter()
            .rev()
            .find(|e| e.role == Role::Assistant)
            .is_some_and(|e| e.content.contains("passiamo al checkout"))
    }

    fn removal_summary(&self, state: &SessionState, removed: &[String]) -> String {
        let view = crate::cart::aggregate(state.cart());
        if view.is_empty() {
            return "Il tuo carrello è ora vuoto.".into();
        }
        let left: Vec<String> = view
            .entries
            .iter()
            .map(|e| format!("{} x{}", e.name, e.count))
            .collect();
        format!(
            "🗑️ Ho rimosso {}. Carrello attuale: {}",
            removed.join(", "),
            left.join(", ")
        )
    }

    fn info_reply(&self) -> String {
        format!(
            "📍 {}\n🕒 {}\n📞 {}\nVuoi vedere il nostro menu o iniziare un ordine?",
            self.info.address, self.info.hours, self.info.phone
        )
    }

    fn track_reply(&self, state: &SessionState) -> String {
        match &state.last_order {
            Some(order) => format!("Il tuo ordine {} sarà pronto alle {}!", order.number, order.eta),
            None => "Nessun ordine trovato. Vuoi ordinarne uno?".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bot() -> MarioBot {
        let dir = std::env::temp_dir().join(format!("damario-bot-{}", std::process::id()));
        MarioBot::new(
            Menu::embedded().unwrap(),
            PizzeriaInfo::default(),
            BotConfig::default(),
            OrderLog::at(&dir),
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn started_session(bot: &MarioBot) -> SessionState {
        let mut state = SessionState::new();
        bot.handle_with_rng(&mut state, "!welcome", &mut rng());
        state
    }

    #[test]
    fn test_welcome_greets_and_starts_ordering() {
        let bot = bot();
        let mut state = SessionState::new();
        let reply = bot.handle_with_rng(&mut state, "!welcome", &mut rng());
        assert!(reply.response.contains("Benvenuto"));
        assert!(reply.cart.is_none());
        assert_eq!(state.step, ConversationStep::Ordering);
    }

    #[test]
    fn test_add_attaches_cart_snapshot() {
        let bot = bot();
        let mut state = started_session(&bot);
        let reply = bot.handle_with_rng(&mut state, "vorrei due margherita", &mut rng());

        assert!(reply.response.contains("✅ *Aggiunto*: Margherita x2"));
        assert!(reply.response.contains("💰 *Totale*: €16.00"));
        let cart = reply.cart.expect("cart attached after add");
        assert_eq!(cart.len(), 2);
        assert_eq!(state.cart().len(), 2);
    }

    #[test]
    fn test_unknown_item_is_reported_without_cart() {
        let bot = bot();
        let mut state = started_session(&bot);
        let reply = bot.handle_with_rng(&mut state, "vorrei un hamburger", &mut rng());
        assert!(reply.response.contains("non è nel nostro menu"));
        assert!(reply.cart.is_none());
        assert!(state.cart().is_empty());
    }

    #[test]
    fn test_remove_updates_cart() {
        let bot = bot();
        let mut state = started_session(&bot);
        bot.handle_with_rng(&mut state, "vorrei due margherita e una coca-cola", &mut rng());

        let reply = bot.handle_with_rng(&mut state, "togli una margherita", &mut rng());
        assert!(reply.response.contains("🗑️ Ho rimosso Margherita"));
        assert!(reply.response.contains("Margherita x1"));
        assert_eq!(reply.cart.unwrap().len(), 2);
    }

    #[test]
    fn test_remove_last_item_reports_empty_cart() {
        let bot = bot();
        let mut state = started_session(&bot);
        bot.handle_with_rng(&mut state, "una diavola", &mut rng());
        let reply = bot.handle_with_rng(&mut state, "togli la diavola", &mut rng());
        assert!(reply.response.contains("carrello è ora vuoto"));
        assert!(reply.cart.unwrap().is_empty());
    }

    #[test]
    fn test_menu_request_has_no_cart() {
        let bot = bot();
        let mut state = started_session(&bot);
        let reply = bot.handle_with_rng(&mut state, "mostrami il menu", &mut rng());
        assert!(reply.response.contains("Menu di Pizzeria Da Mario"));
        assert!(reply.cart.is_none());
    }

    #[test]
    fn test_checkout_clears_cart_and_enables_tracking() {
        let bot = bot();
        let mut state = started_session(&bot);
        bot.handle_with_rng(&mut state, "vorrei due margherita e una coca-cola", &mut rng());

        let reply = bot.handle_with_rng(&mut state, "procedi al checkout", &mut rng());
        assert!(reply.response.contains("Riepilogo Ordine"));
        assert!(reply.response.contains("€18.50"));
        assert!(reply.cart.unwrap().is_empty());
        assert_eq!(state.step, ConversationStep::Ordered);

        let track = bot.handle_with_rng(&mut state, "il mio ordine è pronto?", &mut rng());
        assert!(track.response.contains("sarà pronto alle"));
    }

    #[test]
    fn test_track_without_order() {
        let bot = bot();
        let mut state = started_session(&bot);
        let reply = bot.handle_with_rng(&mut state, "il mio ordine è pronto?", &mut rng());
        assert!(reply.response.contains("Nessun ordine trovato"));
    }

    #[test]
    fn test_affirmation_after_offer_checks_out() {
        let bot = bot();
        let mut state = started_session(&bot);
        bot.handle_with_rng(&mut state, "una margherita", &mut rng());

        // The confirmation ended on "passiamo al checkout?" — a bare
        // "sì" continues into checkout.
        let reply = bot.handle_with_rng(&mut state, "sì", &mut rng());
        assert!(reply.response.contains("Riepilogo Ordine"));
        assert!(state.cart().is_empty());
    }

    #[test]
    fn test_affirmation_without_offer_falls_through() {
        let bot = bot();
        let mut state = started_session(&bot);
        let reply = bot.handle_with_rng(&mut state, "sì", &mut rng());
        assert!(reply.response.contains("Non ho capito bene"));
    }

    #[test]
    fn test_fallback_on_gibberish() {
        let bot = bot();
        let mut state = started_session(&bot);
        let reply = bot.handle_with_rng(&mut state, "che tempo fa domani?", &mut rng());
        assert!(reply.response.contains("Non ho capito bene"));
        assert!(reply.cart.is_none());
    }

    #[test]
    fn test_checkout_on_empty_cart_keeps_state() {
        let bot = bot();
        let mut state = started_session(&bot);
        let reply = bot.handle_with_rng(&mut state, "procedi al checkout", &mut rng());
        assert!(reply.response.contains("carrello è vuoto"));
        assert!(reply.cart.is_none());
        assert_eq!(state.step, ConversationStep::Ordering);
    }

    #[test]
    fn test_bucketing_merges_duplicate_adds() {
        let parsed = vec![
            ParsedIntent {
                intent: Intent::AddToCart,
                items: vec![crate::intent::RequestedItem {
                    name: "Margherita".into(),
                    quantity: 1,
                }],
            },
            ParsedIntent {
                intent: Intent::Order,
                items: vec![crate::intent::RequestedItem {
                    name: "Margherita".into(),
                    quantity: 2,
                }],
            },
        ];
        let bucket = bucket_intents(parsed);
        assert_eq!(bucket.adds, vec![("Margherita".to_string(), 3)]);
    }
}
