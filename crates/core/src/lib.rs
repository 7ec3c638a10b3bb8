//! Bazaar Core - Shared types library.
//!
//! This crate provides common types used across all Bazaar components:
//! - `storefront` - Public marketplace site for consumers
//! - `dashboard` - Merchant dashboard
//! - `cli` - Command-line tools for migrations and backend checks
//!
//! # Architecture
//!
//! The marketplace backend is a separate REST service and the source of truth
//! for stores, products, carts and orders. This crate holds the transfer
//! shapes that service returns plus the small amount of display logic the
//! front ends share (money formatting, status badges).
//!
//! With the `http` feature enabled, [`api::ApiClient`] provides the shared
//! HTTP plumbing: response envelope decoding, bearer auth and the fixed-delay
//! retry used for reads.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, statuses and backend DTOs
//! - [`api`] - Response envelope, pagination, retry policy and HTTP client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod types;

pub use types::*;
