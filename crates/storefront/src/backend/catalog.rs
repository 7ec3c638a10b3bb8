//! Public catalog: stores, products and delivery zones.

use bazaar_core::api::{ApiError, Page};
use bazaar_core::{Product, Store, Zone, ZoneId};
use tracing::{debug, instrument};

use super::Marketplace;
use super::cache::{CacheKey, CacheValue};

/// Stores shown per directory page.
pub const STORES_PER_PAGE: u32 = 12;

/// Products shown per listing page.
pub const PRODUCTS_PER_PAGE: u32 = 24;

/// Filters for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Free-text search.
    pub search: Option<String>,
    /// Product category.
    pub category: Option<String>,
    /// 1-indexed page.
    pub page: u32,
}

impl CatalogQuery {
    /// Build a query from raw request parameters, dropping blank values.
    #[must_use]
    pub fn new(search: Option<&str>, category: Option<&str>, page: Option<u32>) -> Self {
        Self {
            search: non_blank(search),
            category: non_blank(category),
            page: page.unwrap_or(1).max(1),
        }
    }

    fn pairs(&self, limit: u32) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", limit.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Marketplace {
    /// List stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn stores(&self, query: &CatalogQuery) -> Result<Page<Store>, ApiError> {
        let key = CacheKey::Stores { page: query.page };
        let cacheable = query.search.is_none();

        if cacheable && let Some(CacheValue::Stores(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for stores");
            return Ok(page);
        }

        let page: Page<Store> = self
            .inner
            .api
            .get_page(&["stores"], &query.pairs(STORES_PER_PAGE), None)
            .await?;

        if cacheable {
            self.inner
                .cache
                .insert(key, CacheValue::Stores(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a store by its slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no store has this slug.
    #[instrument(skip(self))]
    pub async fn store(&self, slug: &str) -> Result<Store, ApiError> {
        let key = CacheKey::Store(slug.to_string());

        if let Some(CacheValue::Store(store)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for store");
            return Ok(*store);
        }

        let store: Store = self.inner.api.get(&["stores", slug], &[], None).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Store(Box::new(store.clone())))
            .await;

        Ok(store)
    }

    /// List the products of one store.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn store_products(&self, slug: &str, page: u32) -> Result<Page<Product>, ApiError> {
        let key = CacheKey::StoreProducts {
            slug: slug.to_string(),
            page,
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for store products");
            return Ok(products);
        }

        let query = CatalogQuery {
            page,
            ..CatalogQuery::default()
        };
        let products: Page<Product> = self
            .inner
            .api
            .get_page(
                &["stores", slug, "products"],
                &query.pairs(PRODUCTS_PER_PAGE),
                None,
            )
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// List products across all stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &CatalogQuery) -> Result<Page<Product>, ApiError> {
        let key = CacheKey::Products {
            category: query.category.clone(),
            page: query.page,
        };
        let cacheable = query.search.is_none();

        if cacheable && let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Page<Product> = self
            .inner
            .api
            .get_page(&["products"], &query.pairs(PRODUCTS_PER_PAGE), None)
            .await?;

        if cacheable {
            self.inner
                .cache
                .insert(key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn product(&self, id: &str) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.inner.api.get(&["products", id], &[], None).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List delivery zones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn zones(&self) -> Result<Vec<Zone>, ApiError> {
        if let Some(CacheValue::Zones(zones)) = self.inner.cache.get(&CacheKey::Zones).await {
            debug!("Cache hit for zones");
            return Ok(zones);
        }

        let zones = self
            .inner
            .api
            .get_page::<Zone>(&["zones"], &[], None)
            .await?
            .items;

        self.inner
            .cache
            .insert(CacheKey::Zones, CacheValue::Zones(zones.clone()))
            .await;

        Ok(zones)
    }

    /// Find an active zone by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone list cannot be fetched.
    pub async fn active_zone(&self, id: &ZoneId) -> Result<Option<Zone>, ApiError> {
        Ok(self
            .zones()
            .await?
            .into_iter()
            .find(|zone| &zone.id == id && zone.is_active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_query_drops_blank_values() {
        let query = CatalogQuery::new(Some("  "), Some(" bakery "), Some(0));
        assert_eq!(query.search, None);
        assert_eq!(query.category.as_deref(), Some("bakery"));
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_catalog_query_pairs() {
        let query = CatalogQuery::new(Some("bread"), None, Some(3));
        let pairs = query.pairs(PRODUCTS_PER_PAGE);
        assert!(pairs.contains(&("page", "3".to_string())));
        assert!(pairs.contains(&("limit", "24".to_string())));
        assert!(pairs.contains(&("search", "bread".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "category"));
    }
}
