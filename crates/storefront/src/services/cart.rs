//! Cart totals and per-store grouping.
//!
//! The backend stores cart lines; the arithmetic shown to the consumer is
//! done here so that every page agrees on it.

use bazaar_core::{Cart, CartItem, CurrencyCode, Price, StoreId, Zone};

/// Cart lines belonging to one store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreGroup {
    pub store_id: StoreId,
    pub store_name: String,
    pub items: Vec<CartItem>,
    pub subtotal: Price,
}

/// Cart contents grouped by store, with totals.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    /// Groups in the order their store first appears in the cart.
    pub groups: Vec<StoreGroup>,
    /// Sum of quantities.
    pub item_count: u32,
    /// Sum of unit price times quantity over every line.
    pub subtotal: Price,
}

impl CartSummary {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of stores the cart spans.
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.groups.len()
    }
}

/// Price of one cart line.
#[must_use]
pub fn line_total(item: &CartItem, currency: CurrencyCode) -> Price {
    Price::new(item.unit_price, currency).times(item.quantity)
}

/// Compute totals and group the lines by store.
#[must_use]
pub fn summarize(cart: &Cart, currency: CurrencyCode) -> CartSummary {
    let mut groups: Vec<StoreGroup> = Vec::new();
    let mut subtotal = Price::zero(currency);

    for item in &cart.items {
        let line = line_total(item, currency);
        subtotal = subtotal + line;

        if let Some(group) = groups.iter_mut().find(|g| g.store_id == item.store_id) {
            group.subtotal = group.subtotal + line;
            group.items.push(item.clone());
        } else {
            groups.push(StoreGroup {
                store_id: item.store_id.clone(),
                store_name: item
                    .store_name
                    .clone()
                    .unwrap_or_else(|| format!("Store {}", item.store_id)),
                items: vec![item.clone()],
                subtotal: line,
            });
        }
    }

    CartSummary {
        groups,
        item_count: cart.item_count(),
        subtotal,
    }
}

/// Amounts shown on the checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutTotals {
    pub subtotal: Price,
    /// Zero until a zone is chosen.
    pub delivery_fee: Price,
    pub total: Price,
    /// Name of the chosen zone, if any.
    pub zone_name: Option<String>,
    /// Delivery estimate of the chosen zone, if any.
    pub estimated_delivery: Option<String>,
}

impl CheckoutTotals {
    /// Whether a delivery zone has been chosen.
    #[must_use]
    pub const fn zone_selected(&self) -> bool {
        self.zone_name.is_some()
    }
}

/// Add the chosen zone's delivery fee to the cart subtotal.
///
/// Without a zone the fee is zero and the total equals the subtotal.
#[must_use]
pub fn checkout_totals(subtotal: Price, zone: Option<&Zone>) -> CheckoutTotals {
    let delivery_fee = zone.map_or_else(
        || Price::zero(subtotal.currency_code),
        |z| Price::new(z.delivery_fee, subtotal.currency_code),
    );

    CheckoutTotals {
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
        zone_name: zone.map(|z| z.name.clone()),
        estimated_delivery: zone.and_then(|z| z.estimated_delivery.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;

    use bazaar_core::{CartItemId, ProductId, ZoneId};
    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(id: &str, store: &str, price: &str, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(format!("p-{id}")),
            product_name: format!("Product {id}"),
            store_id: StoreId::new(store),
            store_name: Some(format!("{store} shop")),
            unit_price: dec(price),
            quantity,
            image_url: None,
        }
    }

    fn zone(fee: &str) -> Zone {
        Zone {
            id: ZoneId::new("z1"),
            name: "Downtown".to_string(),
            delivery_fee: dec(fee),
            estimated_delivery: Some("30-45 min".to_string()),
            is_active: true,
        }
    }

    #[test]
    fn test_summarize_totals() {
        let cart = Cart {
            id: None,
            items: vec![item("1", "a", "2.50", 4), item("2", "b", "1.25", 2)],
        };
        let summary = summarize(&cart, CurrencyCode::USD);
        assert_eq!(summary.item_count, 6);
        assert_eq!(summary.subtotal.amount, dec("12.50"));
        assert_eq!(summary.subtotal.display(), "$12.50");
    }

    #[test]
    fn test_summarize_groups_by_store_in_first_seen_order() {
        let cart = Cart {
            id: None,
            items: vec![
                item("1", "b", "1.00", 1),
                item("2", "a", "3.00", 1),
                item("3", "b", "2.00", 2),
            ],
        };
        let summary = summarize(&cart, CurrencyCode::USD);
        assert_eq!(summary.store_count(), 2);
        assert_eq!(summary.groups[0].store_id, StoreId::new("b"));
        assert_eq!(summary.groups[0].items.len(), 2);
        assert_eq!(summary.groups[0].subtotal.amount, dec("5.00"));
        assert_eq!(summary.groups[1].store_name, "a shop");
        assert_eq!(summary.groups[1].subtotal.amount, dec("3.00"));
    }

    #[test]
    fn test_summarize_empty_cart() {
        let summary = summarize(&Cart::default(), CurrencyCode::EUR);
        assert!(summary.is_empty());
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.subtotal, Price::zero(CurrencyCode::EUR));
    }

    #[test]
    fn test_missing_store_name_falls_back_to_id() {
        let mut line = item("1", "42", "1.00", 1);
        line.store_name = None;
        let cart = Cart {
            id: None,
            items: vec![line],
        };
        assert_eq!(summarize(&cart, CurrencyCode::USD).groups[0].store_name, "Store 42");
    }

    #[test]
    fn test_checkout_totals_adds_zone_fee() {
        let subtotal = Price::new(dec("20.00"), CurrencyCode::USD);
        let totals = checkout_totals(subtotal, Some(&zone("3.50")));
        assert!(totals.zone_selected());
        assert_eq!(totals.delivery_fee.amount, dec("3.50"));
        assert_eq!(totals.total.display(), "$23.50");
        assert_eq!(totals.zone_name.as_deref(), Some("Downtown"));
    }

    #[test]
    fn test_checkout_totals_without_zone() {
        let subtotal = Price::new(dec("20.00"), CurrencyCode::USD);
        let totals = checkout_totals(subtotal, None);
        assert!(!totals.zone_selected());
        assert_eq!(totals.delivery_fee.amount, Decimal::ZERO);
        assert_eq!(totals.total, subtotal);
    }
}
