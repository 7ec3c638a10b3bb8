//! Session-held models for the dashboard.

pub mod session;

pub use session::{CurrentMerchant, keys as session_keys};
