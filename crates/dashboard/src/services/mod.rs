//! Business logic services for the dashboard.
//!
//! - [`analytics`] - Overview metrics over recent orders

pub mod analytics;
