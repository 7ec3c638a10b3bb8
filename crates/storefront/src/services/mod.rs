//! Storefront business logic that runs before the backend is called.
//!
//! - `cart` - Totals, per-store grouping, delivery fee addition
//! - `checkout` - Order form validation

pub mod cart;
pub mod checkout;
