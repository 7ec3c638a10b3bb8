//! Cache types for catalog responses.

use bazaar_core::api::Page;
use bazaar_core::{Product, Store, Zone};

/// Cache key for catalog reads.
///
/// Searches are never cached, so no key carries a search term.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Stores { page: u32 },
    Store(String),
    StoreProducts { slug: String, page: u32 },
    Products { category: Option<String>, page: u32 },
    Product(String),
    Zones,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Stores(Page<Store>),
    Store(Box<Store>),
    Products(Page<Product>),
    Product(Box<Product>),
    Zones(Vec<Zone>),
}
