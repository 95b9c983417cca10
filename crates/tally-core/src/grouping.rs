//! # Grouping and Ranking
//!
//! Every breakdown on the report screens is the same fold: pick a key for
//! each record, accumulate into a bucket, then sort the buckets.
//!
//! ```text
//! ┌──────────────────┬─────────────────────────┬───────────────────────────┐
//! │ Breakdown        │ Key                     │ Sorted by                 │
//! ├──────────────────┼─────────────────────────┼───────────────────────────┤
//! │ daily_sales      │ local date              │ date ascending            │
//! │ hourly_*         │ local hour 0-23         │ hour ascending            │
//! │ payment_methods  │ method code             │ revenue descending        │
//! │ product_sales    │ product id              │ revenue descending        │
//! │ customer_sales   │ customer name / walk-in │ total descending          │
//! └──────────────────┴─────────────────────────┴───────────────────────────┘
//! ```
//!
//! Records without a usable timestamp are skipped by the time-based
//! breakdowns. Descending sorts break ties by key so output is stable.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Order, OrderItem, PaymentMethods};

/// Hour reported as the peak when no hour beats it.
pub const DEFAULT_PEAK_HOUR: u32 = 12;

/// Label for orders with no customer name.
pub const WALK_IN_CUSTOMER: &str = "Walk-in customer";

/// Rows kept by the top-N views.
pub const DEFAULT_TOP_N: usize = 10;

// =============================================================================
// Fold Helper
// =============================================================================

/// Buckets `items` by `key`, folding each into its bucket's accumulator.
///
/// Items for which `key` returns `None` are skipped.
///
/// ## Example
/// ```rust
/// use tally_core::grouping::fold_groups;
///
/// let words = ["apple", "avocado", "banana"];
/// let counts = fold_groups(words, |w| w.chars().next(), |n: &mut u32, _| *n += 1);
/// assert_eq!(counts[&'a'], 2);
/// assert_eq!(counts[&'b'], 1);
/// ```
pub fn fold_groups<T, K, A, KF, FF>(items: impl IntoIterator<Item = T>, mut key: KF, mut fold: FF) -> BTreeMap<K, A>
where
    K: Ord,
    A: Default,
    KF: FnMut(&T) -> Option<K>,
    FF: FnMut(&mut A, &T),
{
    let mut groups = BTreeMap::new();
    for item in items {
        if let Some(k) = key(&item) {
            fold(groups.entry(k).or_default(), &item);
        }
    }
    groups
}

/// Keeps the first `n` rows.
pub fn top_n<T>(mut rows: Vec<T>, n: usize) -> Vec<T> {
    rows.truncate(n);
    rows
}

fn descending_then_key<V: Ord, K: Ord>(a: (V, &K), b: (V, &K)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

// =============================================================================
// By Day
// =============================================================================

/// One row of the daily sales chart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Σ subtotal + tax.
    pub revenue: Money,
    pub orders: i64,
    pub customers: i64,
    pub discount: Money,
}

/// Orders bucketed by their local calendar date.
pub fn daily_sales<'a>(orders: impl IntoIterator<Item = &'a Order>, offset: &FixedOffset) -> Vec<DailySales> {
    fold_groups(
        orders,
        |order| order.local_time(offset).map(|at| at.date()),
        |day: &mut DailySales, order| {
            day.revenue += order.gross_sales();
            day.orders += 1;
            day.customers += order.customers();
            day.discount += order.discount;
        },
    )
    .into_iter()
    .map(|(date, day)| DailySales { date, ..day })
    .collect()
}

// =============================================================================
// By Hour
// =============================================================================

/// Order count per local hour.
pub fn hourly_order_counts<'a>(orders: impl IntoIterator<Item = &'a Order>, offset: &FixedOffset) -> BTreeMap<u32, i64> {
    fold_groups(
        orders,
        |order| order.local_time(offset).map(|at| at.hour()),
        |count: &mut i64, _| *count += 1,
    )
}

/// Net revenue per local hour; orders with zero or negative revenue are left out.
pub fn hourly_revenue<'a>(orders: impl IntoIterator<Item = &'a Order>, offset: &FixedOffset) -> BTreeMap<u32, Money> {
    fold_groups(
        orders.into_iter().filter(|order| order.net_revenue().is_positive()),
        |order| order.local_time(offset).map(|at| at.hour()),
        |revenue: &mut Money, order| *revenue += order.net_revenue(),
    )
}

/// Busiest hour in `buckets`.
///
/// Starts from [`DEFAULT_PEAK_HOUR`] and scans hours in ascending order,
/// switching only when an hour is strictly greater than the current peak,
/// so the earliest hour wins a tie.
pub fn peak_hour<V>(buckets: &BTreeMap<u32, V>) -> u32
where
    V: PartialOrd + Copy + Default,
{
    let mut peak = DEFAULT_PEAK_HOUR;
    let mut peak_value = buckets.get(&DEFAULT_PEAK_HOUR).copied().unwrap_or_default();
    for (&hour, &value) in buckets {
        if value > peak_value {
            peak = hour;
            peak_value = value;
        }
    }
    peak
}

/// One point of an hourly chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HourlyRevenue {
    pub hour: u32,
    pub revenue: Money,
}

/// Flattens an hourly revenue map into chart points.
pub fn hourly_points(buckets: &BTreeMap<u32, Money>) -> Vec<HourlyRevenue> {
    buckets
        .iter()
        .map(|(&hour, &revenue)| HourlyRevenue { hour, revenue })
        .collect()
}

// =============================================================================
// By Payment Method
// =============================================================================

/// Revenue attributed to one payment method.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentMethodSales {
    pub method: String,
    /// Orders (or split portions) paid with this method.
    pub count: i64,
    pub revenue: Money,
    /// Share of all attributed revenue, 0-100.
    pub share_percent: f64,
}

/// Splits each order's net revenue across the methods it was paid with.
///
/// ## Split Rules
/// ```text
/// paymentMethod = "2"                         → "2" gets all of it
/// paymentMethod = null                        → "cash" gets all of it
/// paymentMethod = [{cash,60},{card,40}], 100  → cash 60, card 40
/// paymentMethod = [{cash,0},{card,0}],  100   → cash 0,  card 0 (counts still +1)
/// ```
/// Split shares always sum exactly to the order's revenue (or to zero when
/// the portion amounts do not add up to anything positive).
pub fn payment_method_sales<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<PaymentMethodSales> {
    let mut buckets: BTreeMap<String, (i64, Money)> = BTreeMap::new();

    for order in orders {
        let revenue = order.net_revenue();
        match order.payment_methods() {
            PaymentMethods::Single(method) => {
                let bucket = buckets.entry(method).or_default();
                bucket.0 += 1;
                bucket.1 += revenue;
            }
            PaymentMethods::Split(portions) => {
                let weights: Vec<Money> = portions.iter().map(|p| p.amount).collect();
                let shares = revenue.allocate(&weights);
                for (portion, share) in portions.iter().zip(shares) {
                    let bucket = buckets
                        .entry(portion.method_or_default().to_string())
                        .or_default();
                    bucket.0 += 1;
                    bucket.1 += share;
                }
            }
        }
    }

    let attributed: Money = buckets.values().map(|(_, revenue)| *revenue).sum();
    let mut rows: Vec<PaymentMethodSales> = buckets
        .into_iter()
        .map(|(method, (count, revenue))| PaymentMethodSales {
            share_percent: revenue.percent_of(attributed),
            method,
            count,
            revenue,
        })
        .collect();
    rows.sort_by(|a, b| descending_then_key((a.revenue, &a.method), (b.revenue, &b.method)));
    rows
}

// =============================================================================
// By Product
// =============================================================================

/// Units and revenue for one product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// Order items grouped by product, best sellers first.
pub fn product_sales<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Vec<ProductSales> {
    let mut rows: Vec<ProductSales> = fold_groups(
        items,
        |item| Some(item.product_id.clone()),
        |row: &mut ProductSales, item| {
            if row.product_name.is_empty() {
                if let Some(name) = &item.product_name {
                    row.product_name = name.clone();
                }
            }
            row.quantity += item.quantity;
            row.revenue += item.total;
        },
    )
    .into_iter()
    .map(|(product_id, row)| ProductSales { product_id, ..row })
    .collect();
    rows.sort_by(|a, b| descending_then_key((a.revenue, &a.product_id), (b.revenue, &b.product_id)));
    rows
}

/// The `n` best-selling products.
pub fn top_products<'a>(items: impl IntoIterator<Item = &'a OrderItem>, n: usize) -> Vec<ProductSales> {
    top_n(product_sales(items), n)
}

// =============================================================================
// By Customer
// =============================================================================

/// Spend of one customer (or of all walk-in guests together).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerSales {
    pub name: String,
    pub orders: i64,
    pub total: Money,
}

/// Orders grouped by customer name, biggest spenders first.
pub fn customer_sales<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<CustomerSales> {
    let mut rows: Vec<CustomerSales> = fold_groups(
        orders,
        |order| {
            Some(
                order
                    .customer_name
                    .clone()
                    .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string()),
            )
        },
        |row: &mut CustomerSales, order| {
            row.orders += 1;
            row.total += order.total;
        },
    )
    .into_iter()
    .map(|(name, row)| CustomerSales { name, ..row })
    .collect();
    rows.sort_by(|a, b| descending_then_key((a.total, &a.name), (b.total, &b.name)));
    rows
}

/// The `n` biggest spenders.
pub fn top_customers<'a>(orders: impl IntoIterator<Item = &'a Order>, n: usize) -> Vec<CustomerSales> {
    top_n(customer_sales(orders), n)
}

// =============================================================================
// Unit Tests
// =============================================================================
