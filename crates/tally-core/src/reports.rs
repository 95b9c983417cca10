//! # Report Composition
//!
//! Assembles the dashboard and sales report from order snapshots. Each report
//! is one pure function over slices, recomputed from scratch whenever the
//! snapshots change.
//!
//! ```text
//! ┌───────────────────────────┐      ┌──────────────────────────────────┐
//! │ DashboardSources          │      │ SalesSources                     │
//! │  store filter             │      │                                  │
//! │  period orders ─ settled  │      │  orders ─ status == paid         │
//! │  order items              │      │  order items ─ of paid orders    │
//! │  current orders ─ active  │      └───────────────┬──────────────────┘
//! └─────────────┬─────────────┘                      │
//!               ▼                                    ▼
//!   summarize · hourly counts · top-N     summarize · daily · payment methods
//!               │                          · hourly revenue · top products
//!               ▼                                    ▼
//!        DashboardStats                         SalesReport
//! ```
//!
//! The spending report lives in [`crate::spending`].

use std::collections::HashSet;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::date_range::DateRange;
use crate::grouping::{
    daily_sales, hourly_order_counts, hourly_points, hourly_revenue, payment_method_sales,
    peak_hour, top_customers, top_products, CustomerSales, DailySales, HourlyRevenue,
    PaymentMethodSales, ProductSales,
};
use crate::money::Money;
use crate::revenue::{summarize, RevenueSummary};
use crate::types::{Order, OrderItem, OrderStatus, StoreFilter};

// =============================================================================
// Dashboard
// =============================================================================

/// Snapshots the dashboard reads.
#[derive(Debug, Clone, Copy)]
pub struct DashboardSources<'a> {
    /// Orders in the selected range and store.
    pub period_orders: &'a [Order],
    /// Order items in the selected range.
    pub items: &'a [OrderItem],
    /// Today's orders regardless of range, for the active-orders tile.
    pub current_orders: &'a [Order],
    /// Applied again here so the report does not depend on the backend
    /// honouring its `storeFilter` parameter.
    pub store: &'a StoreFilter,
}

/// One hour's order count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HourlyOrders {
    pub hour: u32,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub range: DateRange,
    #[serde(flatten)]
    pub summary: RevenueSummary,
    /// Orders still on the floor (pending through served).
    pub active_orders: i64,
    /// Hour of day with the most settled orders.
    pub peak_hour: u32,
    pub hourly_orders: Vec<HourlyOrders>,
    pub top_products: Vec<ProductSales>,
    pub top_customers: Vec<CustomerSales>,
}

impl DashboardStats {
    /// Builds the dashboard.
    ///
    /// Only settled orders (paid or completed) of the selected store count
    /// towards revenue, the hourly chart and the rankings.
    pub fn compute(
        sources: &DashboardSources<'_>,
        range: &DateRange,
        offset: &FixedOffset,
        top_n: usize,
    ) -> Self {
        let in_store = |order: &&Order| sources.store.matches(order.store_code.as_deref());
        let settled: Vec<&Order> = sources
            .period_orders
            .iter()
            .filter(in_store)
            .filter(|order| order.status.is_settled())
            .collect();

        let hourly = hourly_order_counts(settled.iter().copied(), offset);
        let active_orders = sources
            .current_orders
            .iter()
            .filter(in_store)
            .filter(|order| order.status.is_active())
            .count() as i64;

        Self {
            range: *range,
            summary: summarize(settled.iter().copied(), range),
            active_orders,
            peak_hour: peak_hour(&hourly),
            hourly_orders: hourly
                .iter()
                .map(|(&hour, &orders)| HourlyOrders { hour, orders })
                .collect(),
            top_products: top_products(settled_items(&settled, sources.items), top_n),
            top_customers: top_customers(settled.iter().copied(), top_n),
        }
    }
}

// =============================================================================
// Sales Report
// =============================================================================

/// Snapshots the sales report reads.
#[derive(Debug, Clone, Copy)]
pub struct SalesSources<'a> {
    pub orders: &'a [Order],
    pub items: &'a [OrderItem],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesReport {
    pub range: DateRange,
    #[serde(flatten)]
    pub summary: RevenueSummary,
    pub daily_sales: Vec<DailySales>,
    pub payment_methods: Vec<PaymentMethodSales>,
    pub hourly_sales: Vec<HourlyRevenue>,
    /// Hour of day with the highest revenue.
    pub peak_hour: u32,
    pub top_products: Vec<ProductSales>,
}

impl SalesReport {
    /// Builds the sales report from orders whose status is exactly `paid`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{FixedOffset, NaiveDate};
    /// use tally_core::date_range::DateRange;
    /// use tally_core::money::Money;
    /// use tally_core::reports::{SalesReport, SalesSources};
    /// use tally_core::types::{Order, OrderStatus};
    ///
    /// let paid = Order {
    ///     status: OrderStatus::Paid,
    ///     subtotal: Money::from_cents(10_000),
    ///     ..Default::default()
    /// };
    /// let open = Order { status: OrderStatus::Served, ..paid.clone() };
    /// let range = DateRange::single(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    /// let utc = FixedOffset::east_opt(0).unwrap();
    ///
    /// let orders = [paid, open];
    /// let report = SalesReport::compute(&SalesSources { orders: &orders, items: &[] }, &range, &utc, 10);
    /// assert_eq!(report.summary.period_order_count, 1);
    /// assert_eq!(report.summary.total_sales_revenue, Money::from_cents(10_000));
    /// ```
    pub fn compute(
        sources: &SalesSources<'_>,
        range: &DateRange,
        offset: &FixedOffset,
        top_n: usize,
    ) -> Self {
        let paid: Vec<&Order> = sources
            .orders
            .iter()
            .filter(|order| order.status == OrderStatus::Paid)
            .collect();

        let revenue_by_hour = hourly_revenue(paid.iter().copied(), offset);

        Self {
            range: *range,
            summary: summarize(paid.iter().copied(), range),
            daily_sales: daily_sales(paid.iter().copied(), offset),
            payment_methods: payment_method_sales(paid.iter().copied()),
            hourly_sales: hourly_points(&revenue_by_hour),
            peak_hour: peak_hour(&revenue_by_hour),
            top_products: top_products(settled_items(&paid, sources.items), top_n),
        }
    }

    /// Total revenue attributed across payment methods.
    pub fn payment_total(&self) -> Money {
        self.payment_methods.iter().map(|row| row.revenue).sum()
    }
}

/// Items belonging to one of `orders`.
fn settled_items<'a>(
    orders: &[&Order],
    items: &'a [OrderItem],
) -> impl Iterator<Item = &'a OrderItem> {
    let ids: HashSet<String> = orders.iter().map(|order| order.id.clone()).collect();
    items.iter().filter(move |item| ids.contains(&item.order_id))
}

// =============================================================================
// Unit Tests
// =============================================================================
