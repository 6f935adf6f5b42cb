//! Cart aggregation — groups line items by name and computes totals.
//!
//! The cart snapshot arriving from the bot is a flat list of purchased
//! units; the UI wants one row per distinct name with a count and a
//! subtotal, plus a grand total. [`aggregate`] does that in a single
//! linear pass, preserving first-seen order for display.

use rust_decimal::Decimal;

use crate::types::LineItem;

/// Aggregated view of all line items sharing a name. Derived on every
/// render, never stored or mutated independently.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedEntry {
    pub name: String,
    /// Number of line items with this name (>= 1).
    pub count: u32,
    /// Price of the first line item seen with this name. When the same
    /// name was purchased at different prices, later prices still feed
    /// the subtotal but this field keeps the first one.
    pub unit_price: Decimal,
    /// Exact sum of the individual item prices in this group.
    pub subtotal: Decimal,
}

/// Result of aggregating a cart snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    /// Total number of line items (== snapshot length).
    pub total_count: usize,
    /// One entry per distinct name, in first-seen order.
    pub entries: Vec<GroupedEntry>,
    /// Exact sum of all line-item prices.
    pub grand_total: Decimal,
}

impl CartView {
    /// Empty-state flag. An empty cart renders a sentinel line instead
    /// of a zero-row list.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Grand total formatted for display, e.g. `€18.50` (`€0.00` when empty).
    pub fn grand_total_display(&self) -> String {
        format_eur(self.grand_total)
    }
}

/// Convert a wire-side price to exact money (2 decimal places).
///
/// Same idiom as converting server floats to `Decimal` elsewhere: a
/// non-finite price degrades to zero rather than poisoning the total.
pub fn to_money(price: f64) -> Decimal {
    Decimal::from_f64_retain(price).unwrap_or_default().round_dp(2)
}

/// Format an amount with the Euro prefix and two decimals.
pub fn format_eur(amount: Decimal) -> String {
    format!("€{:.2}", amount.round_dp(2))
}

/// Aggregate a cart snapshot into a grouped view.
///
/// Single pass: per item, look up or create its group by name,
/// increment the count, and accumulate the price into the group
/// subtotal and the grand total. Totals are accumulated as `Decimal`
/// so `sum(subtotal) == grand_total` holds exactly.
pub fn aggregate(items: &[LineItem]) -> CartView {
    let mut entries: Vec<GroupedEntry> = Vec::new();
    let mut grand_total = Decimal::ZERO;

    for item in items {
        let price = to_money(item.price);
        grand_total += price;

        if let Some(idx) = entries.iter().position(|e| e.name == item.name) {
            entries[idx].count += 1;
            entries[idx].subtotal += price;
        } else {
            entries.push(GroupedEntry {
                name: item.name.clone(),
                count: 1,
                unit_price: price,
                subtotal: price,
            });
        }
    }

    CartView {
        total_count: items.len(),
        entries,
        grand_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(name: &str, price: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            price,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let view = aggregate(&[]);
        assert_eq!(view.total_count, 0);
        assert!(view.entries.is_empty());
        assert!(view.is_empty());
        assert_eq!(view.grand_total_display(), "€0.00");
    }

    #[test]
    fn test_worked_example() {
        // Margherita x2 + Coca-Cola, the canonical cart.
        let cart = [
            item("Margherita", 8.0),
            item("Margherita", 8.0),
            item("Coca-Cola", 2.5),
        ];
        let view = aggregate(&cart);

        assert_eq!(view.total_count, 3);
        assert_eq!(view.entries.len(), 2);

        assert_eq!(view.entries[0].name, "Margherita");
        assert_eq!(view.entries[0].count, 2);
        assert_eq!(view.entries[0].subtotal, dec!(16.00));

        assert_eq!(view.entries[1].name, "Coca-Cola");
        assert_eq!(view.entries[1].count, 1);
        assert_eq!(view.entries[1].subtotal, dec!(2.50));

        assert_eq!(view.grand_total_display(), "€18.50");
    }

    #[test]
    fn test_first_seen_order_preserved() {
        let cart = [
            item("Coca-Cola", 2.5),
            item("Margherita", 8.0),
            item("Coca-Cola", 2.5),
        ];
        let view = aggregate(&cart);
        let names: Vec<&str> = view.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Coca-Cola", "Margherita"]);
    }

    #[test]
    fn test_subtotals_sum_to_grand_total() {
        let cart = [
            item("Diavola", 9.5),
            item("Tiramisù", 4.5),
            item("Diavola", 9.5),
            item("Acqua Naturale", 1.5),
        ];
        let view = aggregate(&cart);
        let sum: Decimal = view.entries.iter().map(|e| e.subtotal).sum();
        assert_eq!(sum, view.grand_total);
        assert_eq!(view.grand_total, dec!(25.00));
    }

    #[test]
    fn test_counts_sum_to_total_count() {
        let cart = [
            item("Margherita", 8.0),
            item("Diavola", 9.5),
            item("Margherita", 8.0),
        ];
        let view = aggregate(&cart);
        let counted: u32 = view.entries.iter().map(|e| e.count).sum();
        assert_eq!(counted as usize, view.total_count);
        assert_eq!(view.total_count, cart.len());
    }

    #[test]
    fn test_idempotent() {
        let cart = [item("Margherita", 8.0), item("Coca-Cola", 2.5)];
        assert_eq!(aggregate(&cart), aggregate(&cart));
    }

    #[test]
    fn test_first_seen_price_divergence() {
        // Same name at two prices (promotion mid-session). The group
        // keeps the first-seen unit price, while the subtotal reflects
        // the actual prices paid, so unit_price * count can disagree
        // with subtotal. Pinned here on purpose.
        let cart = [item("Margherita", 8.0), item("Margherita", 6.0)];
        let view = aggregate(&cart);

        let entry = &view.entries[0];
        assert_eq!(entry.unit_price, dec!(8.00));
        assert_eq!(entry.subtotal, dec!(14.00));
        assert_ne!(entry.unit_price * Decimal::from(entry.count), entry.subtotal);
        assert_eq!(view.grand_total, dec!(14.00));
    }

    #[test]
    fn test_money_conversion_is_exact_at_two_decimals() {
        // 0.1 + 0.2 style float dust must not leak into totals.
        let cart = [item("Acqua Naturale", 0.1), item("Acqua Naturale", 0.2)];
        let view = aggregate(&cart);
        assert_eq!(view.grand_total, dec!(0.30));
        assert_eq!(view.grand_total_display(), "€0.30");
    }

    #[test]
    fn test_format_eur_pads_decimals() {
        assert_eq!(format_eur(dec!(7)), "€7.00");
        assert_eq!(format_eur(dec!(9.5)), "€9.50");
    }
}
