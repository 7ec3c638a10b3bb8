//! Checkout form validation.
//!
//! Catches the mistakes the consumer can fix on the page before the order
//! is sent. Stock, pricing and store availability are the backend's call.

use bazaar_core::{Address, Cart, Zone};
use thiserror::Error;

use crate::backend::NewOrder;

/// Maximum length of delivery notes, in characters.
pub const MAX_NOTES_LENGTH: usize = 500;

/// Reasons a checkout form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,
    #[error("Please choose a delivery address.")]
    MissingAddress,
    #[error("The selected address could not be found.")]
    UnknownAddress,
    #[error("Please choose a delivery zone.")]
    MissingZone,
    #[error("The selected delivery zone is not available.")]
    UnavailableZone,
    #[error("Delivery notes must be at most {max} characters.")]
    NotesTooLong { max: usize },
}

/// Raw checkout form input.
#[derive(Debug, Clone, Default)]
pub struct CheckoutInput<'a> {
    pub address_id: Option<&'a str>,
    pub zone_id: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Validate the checkout form against the consumer's cart, address book
/// and the active zones, producing the order payload.
///
/// # Errors
///
/// Returns the first problem found, in form order.
pub fn validate(
    cart: &Cart,
    addresses: &[Address],
    zones: &[Zone],
    input: &CheckoutInput<'_>,
) -> Result<NewOrder, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let address_id = non_blank(input.address_id).ok_or(CheckoutError::MissingAddress)?;
    let address = addresses
        .iter()
        .find(|a| a.id.as_str() == address_id)
        .ok_or(CheckoutError::UnknownAddress)?;

    let zone_id = non_blank(input.zone_id).ok_or(CheckoutError::MissingZone)?;
    let zone = zones
        .iter()
        .find(|z| z.id.as_str() == zone_id && z.is_active)
        .ok_or(CheckoutError::UnavailableZone)?;

    let notes = non_blank(input.notes);
    if notes.is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH) {
        return Err(CheckoutError::NotesTooLong {
            max: MAX_NOTES_LENGTH,
        });
    }

    Ok(NewOrder {
        address_id: address.id.clone(),
        zone_id: zone.id.clone(),
        notes: notes.map(str::to_string),
    })
}

/// The zone to preselect: the chosen address's zone when it is active.
#[must_use]
pub fn default_zone<'a>(address: Option<&Address>, zones: &'a [Zone]) -> Option<&'a Zone> {
    let zone_id = address?.zone_id.as_ref()?;
    zones.iter().find(|z| &z.id == zone_id && z.is_active)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{AddressId, CartItem, CartItemId, ProductId, StoreId, ZoneId};
    use rust_decimal::Decimal;

    use super::*;

    fn cart() -> Cart {
        Cart {
            id: None,
            items: vec![CartItem {
                id: CartItemId::new("1"),
                product_id: ProductId::new("p1"),
                product_name: "Sourdough".to_string(),
                store_id: StoreId::new("s1"),
                store_name: None,
                unit_price: Decimal::new(450, 2),
                quantity: 1,
                image_url: None,
            }],
        }
    }

    fn address(id: &str, zone: Option<&str>) -> Address {
        Address {
            id: AddressId::new(id),
            label: None,
            recipient_name: "Ada".to_string(),
            phone: None,
            line1: "1 Main St".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            zone_id: zone.map(ZoneId::new),
            notes: None,
            is_default: false,
        }
    }

    fn zone(id: &str, active: bool) -> Zone {
        Zone {
            id: ZoneId::new(id),
            name: format!("Zone {id}"),
            delivery_fee: Decimal::new(300, 2),
            estimated_delivery: None,
            is_active: active,
        }
    }

    fn input<'a>(address: &'a str, zone: &'a str, notes: Option<&'a str>) -> CheckoutInput<'a> {
        CheckoutInput {
            address_id: Some(address),
            zone_id: Some(zone),
            notes,
        }
    }

    #[test]
    fn test_valid_checkout_builds_payload() {
        let order = validate(
            &cart(),
            &[address("a1", None)],
            &[zone("z1", true)],
            &input("a1", "z1", Some("  Leave at door ")),
        )
        .unwrap();
        assert_eq!(order.address_id, AddressId::new("a1"));
        assert_eq!(order.zone_id, ZoneId::new("z1"));
        assert_eq!(order.notes.as_deref(), Some("Leave at door"));
    }

    #[test]
    fn test_rejects_empty_cart() {
        let err = validate(
            &Cart::default(),
            &[address("a1", None)],
            &[zone("z1", true)],
            &input("a1", "z1", None),
        )
        .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn test_rejects_missing_or_unknown_address() {
        let zones = [zone("z1", true)];
        let addresses = [address("a1", None)];
        assert_eq!(
            validate(&cart(), &addresses, &zones, &input(" ", "z1", None)).unwrap_err(),
            CheckoutError::MissingAddress
        );
        assert_eq!(
            validate(&cart(), &addresses, &zones, &input("a9", "z1", None)).unwrap_err(),
            CheckoutError::UnknownAddress
        );
    }

    #[test]
    fn test_rejects_missing_and_inactive_zone() {
        let addresses = [address("a1", None)];
        let zones = [zone("z1", false)];
        assert_eq!(
            validate(&cart(), &addresses, &zones, &input("a1", "", None)).unwrap_err(),
            CheckoutError::MissingZone
        );
        assert_eq!(
            validate(&cart(), &addresses, &zones, &input("a1", "z1", None)).unwrap_err(),
            CheckoutError::UnavailableZone
        );
    }

    #[test]
    fn test_rejects_long_notes() {
        let notes = "x".repeat(MAX_NOTES_LENGTH + 1);
        let err = validate(
            &cart(),
            &[address("a1", None)],
            &[zone("z1", true)],
            &input("a1", "z1", Some(&notes)),
        )
        .unwrap_err();
        assert_eq!(err, CheckoutError::NotesTooLong { max: 500 });
    }

    #[test]
    fn test_default_zone_follows_address() {
        let zones = [zone("z1", true), zone("z2", false)];
        let home = address("a1", Some("z1"));
        let office = address("a2", Some("z2"));
        assert_eq!(default_zone(Some(&home), &zones).map(|z| z.id.as_str()), Some("z1"));
        assert!(default_zone(Some(&office), &zones).is_none());
        assert!(default_zone(None, &zones).is_none());
    }
}
