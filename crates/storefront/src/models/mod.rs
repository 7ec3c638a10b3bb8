//! Session-held models for the storefront.

pub mod session;

pub use session::{CurrentConsumer, keys as session_keys};
