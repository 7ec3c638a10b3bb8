//! Core types for Bazaar.
//!
//! Type-safe wrappers for common domain concepts and the data-transfer
//! shapes returned by the marketplace backend.

pub mod account;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod status;
pub mod store;
pub mod token;
pub mod tracking;
pub mod zone;

pub use account::{Address, AddressInput, ConsumerProfile, ConsumerSession, Merchant, MerchantSession};
pub use cart::{Cart, CartItem};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem};
pub use price::{CurrencyCode, Price};
pub use status::{BadgeTone, OrderStatus, StatusBadge};
pub use store::{Product, Store};
pub use token::AuthToken;
pub use tracking::{TrackingNumber, TrackingNumberError};
pub use zone::Zone;
