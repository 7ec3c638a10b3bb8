//! Orders placed with the merchant's store.

use bazaar_core::api::{ApiError, Page};
use bazaar_core::{AuthToken, Order, OrderId, OrderStatus};
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

/// Orders shown per dashboard page.
pub const ORDERS_PER_PAGE: u32 = 20;

/// Which orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub page: u32,
    pub limit: u32,
}

impl OrderFilter {
    #[must_use]
    pub const fn new(status: Option<OrderStatus>, page: u32) -> Self {
        Self {
            status,
            page,
            limit: ORDERS_PER_PAGE,
        }
    }

    /// Query pairs for the backend.
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        query
    }
}

#[derive(Serialize)]
struct StatusChange {
    status: OrderStatus,
}

impl Marketplace {
    /// Orders for the merchant's store, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(
        &self,
        token: &AuthToken,
        filter: OrderFilter,
    ) -> Result<Page<Order>, ApiError> {
        self.inner
            .api
            .get_page(&["merchants", "me", "orders"], &filter.query(), Some(token))
            .await
    }

    /// One order placed with the merchant's store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order is not the merchant's.
    #[instrument(skip(self, token))]
    pub async fn my_order(&self, token: &AuthToken, id: &OrderId) -> Result<Order, ApiError> {
        self.inner
            .api
            .get(&["merchants", "me", "orders", id.as_str()], &[], Some(token))
            .await
    }

    /// Move an order to a new status.
    ///
    /// The backend decides which transitions are allowed; a refused
    /// transition comes back as an error carrying its message.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the transition.
    #[instrument(skip(self, token))]
    pub async fn update_order_status(
        &self,
        token: &AuthToken,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.inner
            .api
            .patch(
                &["merchants", "me", "orders", id.as_str(), "status"],
                &StatusChange { status },
                Some(token),
            )
            .await
    }
}
