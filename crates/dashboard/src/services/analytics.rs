//! Overview metrics computed from the merchant's recent orders.
//!
//! The backend has no reporting endpoint; the overview fetches the most
//! recent orders and aggregates them here. Cancelled orders appear in the
//! status breakdown and nowhere else.

use std::collections::HashMap;

use bazaar_core::{Order, OrderStatus, ProductId};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

/// How many recent orders the overview aggregates.
pub const ANALYTICS_ORDER_LIMIT: u32 = 100;

/// Entries in the best-seller list.
pub const TOP_PRODUCT_COUNT: usize = 5;

/// Days covered by the revenue chart, today included.
pub const REVENUE_DAYS: u64 = 7;

/// Number of orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

/// Units and revenue for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u64,
    pub revenue: Decimal,
}

/// Revenue taken on one calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub orders: usize,
}

/// Aggregated overview metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardMetrics {
    /// Orders that were not cancelled.
    pub order_count: usize,
    /// Sum of order totals, cancelled orders excluded.
    pub revenue: Decimal,
    /// `revenue / order_count`, rounded to cents; zero without orders.
    pub average_order_value: Decimal,
    /// Orders not yet delivered or cancelled.
    pub open_orders: usize,
    /// Every known status in lifecycle order, then unrecognised ones if any.
    pub status_counts: Vec<StatusCount>,
    /// Best sellers by units, at most [`TOP_PRODUCT_COUNT`].
    pub top_products: Vec<ProductSales>,
    /// One entry per day, oldest first, ending with `today`.
    pub daily_revenue: Vec<DailyRevenue>,
}

/// Aggregate `orders` as of `today`.
#[must_use]
pub fn compute(orders: &[Order], today: NaiveDate) -> DashboardMetrics {
    let counted: Vec<&Order> = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .collect();

    let order_count = counted.len();
    let revenue: Decimal = counted.iter().map(|o| o.total).sum();
    let average_order_value = if order_count == 0 {
        Decimal::ZERO
    } else {
        (revenue / Decimal::from(order_count)).round_dp(2)
    };

    DashboardMetrics {
        order_count,
        revenue,
        average_order_value,
        open_orders: orders.iter().filter(|o| !o.status.is_terminal()).count(),
        status_counts: status_counts(orders),
        top_products: top_products(&counted),
        daily_revenue: daily_revenue(&counted, today),
    }
}

fn status_counts(orders: &[Order]) -> Vec<StatusCount> {
    let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();

    let mut counts: Vec<StatusCount> = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: count(status),
        })
        .collect();

    let unknown = count(OrderStatus::Unknown);
    if unknown > 0 {
        counts.push(StatusCount {
            status: OrderStatus::Unknown,
            count: unknown,
        });
    }
    counts
}

fn top_products(orders: &[&Order]) -> Vec<ProductSales> {
    let mut by_product: HashMap<&ProductId, ProductSales> = HashMap::new();

    for item in orders.iter().flat_map(|o| &o.items) {
        let entry = by_product
            .entry(&item.product_id)
            .or_insert_with(|| ProductSales {
                product_id: item.product_id.clone(),
                name: item.product_name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
        entry.quantity += u64::from(item.quantity);
        entry.revenue += item.line_total();
    }

    let mut sales: Vec<ProductSales> = by_product.into_values().collect();
    sales.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.name.cmp(&b.name))
    });
    sales.truncate(TOP_PRODUCT_COUNT);
    sales
}

fn daily_revenue(orders: &[&Order], today: NaiveDate) -> Vec<DailyRevenue> {
    (0..REVENUE_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| {
            let on_day = orders.iter().filter(|o| o.created_at.date_naive() == date);
            DailyRevenue {
                date,
                revenue: on_day.clone().map(|o| o.total).sum(),
                orders: on_day.count(),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;

    use bazaar_core::{OrderId, OrderItem, TrackingNumber};
    use chrono::{DateTime, Utc};

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn item(product: &str, price: &str, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(product),
            product_name: format!("Product {product}"),
            unit_price: dec(price),
            quantity,
        }
    }

    fn order(id: &str, status: OrderStatus, total: &str, at: &str, items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(id),
            tracking_number: TrackingNumber::parse(&format!("BZR-{id}")).unwrap(),
            status,
            store_id: None,
            store_name: None,
            customer_name: None,
            items,
            subtotal: dec(total),
            delivery_fee: Decimal::ZERO,
            total: dec(total),
            zone_name: None,
            address: None,
            notes: None,
            created_at: DateTime::<Utc>::from_str(at).unwrap(),
            updated_at: None,
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order(
                "1",
                OrderStatus::Delivered,
                "20.00",
                "2024-05-10T09:00:00Z",
                vec![item("a", "5.00", 2), item("b", "10.00", 1)],
            ),
            order(
                "2",
                OrderStatus::Pending,
                "10.00",
                "2024-05-12T18:30:00Z",
                vec![item("a", "5.00", 2)],
            ),
            order(
                "3",
                OrderStatus::Cancelled,
                "99.00",
                "2024-05-12T19:00:00Z",
                vec![item("c", "99.00", 1)],
            ),
            order(
                "4",
                OrderStatus::Preparing,
                "15.00",
                "2024-05-01T12:00:00Z",
                vec![item("b", "15.00", 1)],
            ),
        ]
    }

    #[test]
    fn test_totals_exclude_cancelled() {
        let metrics = compute(&sample(), day("2024-05-12"));
        assert_eq!(metrics.order_count, 3);
        assert_eq!(metrics.revenue, dec("45.00"));
        assert_eq!(metrics.average_order_value, dec("15.00"));
        assert_eq!(metrics.open_orders, 2);
    }

    #[test]
    fn test_average_rounds_to_cents() {
        let orders = vec![
            order("1", OrderStatus::Delivered, "10.00", "2024-05-10T09:00:00Z", vec![]),
            order("2", OrderStatus::Delivered, "10.00", "2024-05-10T09:00:00Z", vec![]),
            order("3", OrderStatus::Delivered, "0.01", "2024-05-10T09:00:00Z", vec![]),
        ];
        assert_eq!(
            compute(&orders, day("2024-05-12")).average_order_value,
            dec("6.67")
        );
    }

    #[test]
    fn test_status_breakdown_in_lifecycle_order() {
        let mut orders = sample();
        orders.push(order(
            "5",
            OrderStatus::Unknown,
            "1.00",
            "2024-05-12T10:00:00Z",
            vec![],
        ));
        let counts = compute(&orders, day("2024-05-12")).status_counts;
        let statuses: Vec<OrderStatus> = counts.iter().map(|c| c.status).collect();
        assert_eq!(&statuses[..7], &OrderStatus::ALL);
        assert_eq!(counts[0].count, 1);
        assert_eq!(counts[2].count, 1);
        assert_eq!(counts[6].count, 1);
        assert_eq!(counts[7], StatusCount {
            status: OrderStatus::Unknown,
            count: 1
        });
    }

    #[test]
    fn test_top_products_by_quantity() {
        let top = compute(&sample(), day("2024-05-12")).top_products;
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, ProductId::new("a"));
        assert_eq!(top[0].quantity, 4);
        assert_eq!(top[0].revenue, dec("20.00"));
        assert_eq!(top[1].product_id, ProductId::new("b"));
        assert_eq!(top[1].revenue, dec("25.00"));
    }

    #[test]
    fn test_top_products_capped() {
        let items: Vec<OrderItem> = (0..8).map(|i| item(&i.to_string(), "1.00", i + 1)).collect();
        let orders = vec![order("1", OrderStatus::Delivered, "36.00", "2024-05-10T09:00:00Z", items)];
        let top = compute(&orders, day("2024-05-12")).top_products;
        assert_eq!(top.len(), TOP_PRODUCT_COUNT);
        assert_eq!(top[0].quantity, 8);
    }

    #[test]
    fn test_daily_revenue_covers_last_seven_days() {
        let daily = compute(&sample(), day("2024-05-12")).daily_revenue;
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].date, day("2024-05-06"));
        assert_eq!(daily[6].date, day("2024-05-12"));
        assert_eq!(daily[6].revenue, dec("10.00"));
        assert_eq!(daily[6].orders, 1);
        assert_eq!(daily[4].revenue, dec("20.00"));
        // The May 1st order falls outside the window.
        let windowed: Decimal = daily.iter().map(|d| d.revenue).sum();
        assert_eq!(windowed, dec("30.00"));
    }

    #[test]
    fn test_no_orders() {
        let metrics = compute(&[], day("2024-05-12"));
        assert_eq!(metrics.order_count, 0);
        assert_eq!(metrics.average_order_value, Decimal::ZERO);
        assert!(metrics.top_products.is_empty());
        assert!(metrics.daily_revenue.iter().all(|d| d.orders == 0));
    }
}
