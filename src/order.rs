//! Order confirmation and checkout summaries.
//!
//! Pure builders over the aggregated cart view: the confirmation shown
//! after adds (with an upsell suggestion), and the final checkout
//! summary that clears the cart and records the last order.

use chrono::{Duration, Local};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::cart::{self, format_eur};
use crate::config::{BotConfig, PizzeriaInfo};
use crate::menu::Menu;
use crate::session::{LastOrder, SessionState};

/// Line written to the audit log after a completed checkout.
#[derive(Debug, Clone)]
pub struct CompletedOrder {
    pub number: String,
    pub eta: String,
    pub main_item: String,
    pub total_items: usize,
}

/// Confirmation message after items were added: the order so far, the
/// running total, and possibly an upsell from a category not yet in
/// the cart.
pub fn confirmation_message(
    state: &SessionState,
    menu: &Menu,
    added: &[(String, u32)],
    rng: &mut impl Rng,
) -> String {
    let view = cart::aggregate(state.cart());
    if view.is_empty() {
        return "🛒 Il tuo carrello è vuoto. Puoi dire 'menu' per vedere le nostre opzioni deliziose!"
            .into();
    }

    let mut message = Vec::new();

    if !added.is_empty() {
        let added_text: Vec<String> = added.iter().map(|(n, q)| format!("{n} x{q}")).collect();
        message.push(format!("✅ *Aggiunto*: {}\n", added_text.join(", ")));
    }

    message.push("🧾 *Il tuo ordine finora:*\n".into());
    for entry in &view.entries {
        message.push(format!("• {} x{}", entry.name, entry.count));
    }

    message.push(format!("\n💰 *Totale*: {}", view.grand_total_display()));

    if let Some(upsell) = upsell_suggestion(menu, state, rng) {
        message.push(upsell);
    }

    message.push("\nVuoi aggiungere altro o passiamo al checkout?".into());
    message.join("\n\n")
}

/// Suggest an item from a category missing from the cart (drinks with
/// a pizza, dessert with either). Returns `None` when nothing fits.
fn upsell_suggestion(menu: &Menu, state: &SessionState, rng: &mut impl Rng) -> Option<String> {
    let covered = menu.sections_covered(state.cart().iter().map(|i| i.name.as_str()));

    let mut missing: Vec<&str> = Vec::new();
    if covered.contains("pizze") && !covered.contains("bevande") {
        missing.push("Bevande");
    }
    if (covered.contains("pizze") || covered.contains("bevande")) && !covered.contains("dolci") {
        missing.push("Dolci");
    }

    let section_name = *missing.choose(rng)?;
    let section = menu.sections.iter().find(|s| s.name == section_name)?;
    let suggestion = section.items.choose(rng)?;

    Some(format!(
        "\n✨ *Aggiungiamo un* _{}_ *per €{:.2}?* È perfetto con la tua pizza!",
        suggestion.name, suggestion.price
    ))
}

/// Finalise the order: build the markdown summary, clear the cart,
/// record the last order, and return the record for the audit log.
///
/// An empty cart produces only a nudge message and changes nothing.
pub fn checkout(
    state: &mut SessionState,
    info: &PizzeriaInfo,
    config: &BotConfig,
    rng: &mut impl Rng,
) -> (String, Option<CompletedOrder>) {
    let view = cart::aggregate(state.cart());
    if view.is_empty() {
        return (
            "🛒 *Il tuo carrello è vuoto.* Vuoi ordinare qualcosa?".into(),
            None,
        );
    }

    let mut lines = vec!["# 📋 *Riepilogo Ordine*\n".to_string()];

    lines.push("## Prodotti:".into());
    for entry in &view.entries {
        lines.push(format!(
            "- **{}** × {} = {}",
            entry.name,
            entry.count,
            format_eur(entry.subtotal)
        ));
    }

    lines.push("\n---".into());
    lines.push(format!("## *Totale:* {}", view.grand_total_display()));

    let minutes = rng.gen_range(config.eta_min_minutes..=config.eta_max_minutes);
    let eta = (Local::now() + Duration::minutes(minutes))
        .format("%H:%M")
        .to_string();
    let number = format!("#{}", rng.gen_range(1000..=9999));

    lines.push("\n## Dettagli:".into());
    lines.push(format!("- **Ordine:** {number}"));
    lines.push(format!("- **Ritiro:** *{eta}* presso {}", info.address));

    lines.push("\n## ✅ *Ordine Confermato!*".into());
    lines.push(format!(
        "\n*Grazie per aver scelto {}!* 🍕 *Buon appetito!*",
        info.name
    ));

    let record = CompletedOrder {
        number: number.clone(),
        eta: eta.clone(),
        main_item: view.entries[0].name.clone(),
        total_items: view.total_count,
    };

    state.replace_cart(Vec::new());
    state.last_order = Some(LastOrder {
        number,
        eta,
        total: view.grand_total,
    });
    state.step = crate::session::ConversationStep::Ordered;

    (lines.join("\n"), Some(record))
}
