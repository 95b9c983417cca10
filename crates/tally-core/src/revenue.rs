//! # Revenue Reconciliation
//!
//! Turns a set of already-filtered orders into the headline figures shown on
//! the dashboard and the sales report.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders ──► Σ net_revenue()        = totalSalesRevenue                  │
//! │         ──► Σ subtotal − discount  = subtotalRevenue                    │
//! │         ──► count                  = periodOrderCount                   │
//! │         ──► Σ customers()          = periodCustomerCount                │
//! │                                                                         │
//! │  averageOrderValue   = totalSalesRevenue / periodOrderCount (0 if none) │
//! │  dailyAverageRevenue = totalSalesRevenue / range.day_count()            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sums are integer hundredths, so the result does not depend on the order
//! in which the backend returned the records.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::date_range::DateRange;
use crate::money::Money;
use crate::types::Order;

/// Headline revenue figures for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RevenueSummary {
    pub total_sales_revenue: Money,
    pub subtotal_revenue: Money,
    pub period_order_count: i64,
    pub period_customer_count: i64,
    pub average_order_value: Money,
    pub daily_average_revenue: Money,
}

/// Summarizes `orders` over `range`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::date_range::DateRange;
/// use tally_core::money::Money;
/// use tally_core::revenue::summarize;
/// use tally_core::types::Order;
///
/// let order = Order {
///     subtotal: Money::from_cents(10_000),
///     tax: Money::from_cents(800),
///     ..Default::default()
/// };
/// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let summary = summarize(&[order], &DateRange::single(day));
/// assert_eq!(summary.total_sales_revenue, Money::from_cents(10_800));
/// assert_eq!(summary.period_customer_count, 1);
/// ```
pub fn summarize<'a, I>(orders: I, range: &DateRange) -> RevenueSummary
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut summary = orders
        .into_iter()
        .fold(RevenueSummary::default(), |mut acc, order| {
            acc.total_sales_revenue += order.net_revenue();
            acc.subtotal_revenue += order.pre_tax_revenue();
            acc.period_order_count += 1;
            acc.period_customer_count += order.customers();
            acc
        });

    summary.average_order_value = summary
        .total_sales_revenue
        .div_round(summary.period_order_count);
    summary.daily_average_revenue = summary.total_sales_revenue.div_round(range.day_count());
    summary
}

/// Σ net revenue over `orders`.
pub fn total_sales_revenue<'a, I>(orders: I) -> Money
where
    I: IntoIterator<Item = &'a Order>,
{
    orders.into_iter().map(Order::net_revenue).sum()
}

/// Σ billed total over orders whose payment has been collected.
///
/// This is the revenue side of the spending report's net profit.
pub fn collected_revenue<'a, I>(orders: I) -> Money
where
    I: IntoIterator<Item = &'a Order>,
{
    orders
        .into_iter()
        .filter(|order| order.is_paid())
        .map(|order| order.total)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order(subtotal: i64, discount: i64, tax: i64, include_tax: bool, customers: Option<i64>) -> Order {
        Order {
            subtotal: Money::from_cents(subtotal),
            discount: Money::from_cents(discount),
            tax: Money::from_cents(tax),
            total: Money::from_cents(subtotal - discount + tax),
            price_include_tax: include_tax,
            customer_count: customers,
            ..Default::default()
        }
    }

    fn ten_days() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
    }

    #[test]
    fn test_summary_mixes_tax_modes() {
        let orders = vec![
            order(10_000, 1_000, 800, false, Some(2)),
            order(20_000, 0, 1_600, true, None),
        ];
        let summary = summarize(&orders, &ten_days());

        // 9_800 + 20_000
        assert_eq!(summary.total_sales_revenue, Money::from_cents(29_800));
        assert_eq!(summary.subtotal_revenue, Money::from_cents(29_000));
        assert_eq!(summary.period_order_count, 2);
        assert_eq!(summary.period_customer_count, 3);
        assert_eq!(summary.average_order_value, Money::from_cents(14_900));
        assert_eq!(summary.daily_average_revenue, Money::from_cents(2_980));
    }

    #[test]
    fn test_empty_period_is_all_zero() {
        let summary = summarize(&[], &ten_days());
        assert_eq!(summary, RevenueSummary::default());
    }

    #[test]
    fn test_average_is_total_over_count() {
        let orders: Vec<Order> = (1..=7)
            .map(|i| order(i * 1_333, i * 7, i * 101, i % 2 == 0, Some(i)))
            .collect();
        let summary = summarize(&orders, &ten_days());
        assert_eq!(
            summary.average_order_value,
            summary.total_sales_revenue.div_round(summary.period_order_count)
        );
    }

    #[test]
    fn test_total_is_independent_of_iteration_order() {
        let mut orders: Vec<Order> = (0..50)
            .map(|i| order(i * 997 + 13, i * 31, i * 89, i % 3 == 0, None))
            .collect();
        let forward = summarize(&orders, &ten_days());
        orders.reverse();
        let backward = summarize(&orders, &ten_days());
        orders.rotate_left(17);
        let rotated = summarize(&orders, &ten_days());

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
        assert_eq!(forward.total_sales_revenue, total_sales_revenue(&orders));
    }

    #[test]
    fn test_recomputing_is_bit_identical() {
        let orders = vec![order(12_345, 45, 678, false, Some(0)), order(1, 0, 0, true, None)];
        assert_eq!(summarize(&orders, &ten_days()), summarize(&orders, &ten_days()));
    }

    #[test]
    fn test_collected_revenue_counts_paid_only() {
        let mut paid = order(10_000, 0, 0, false, None);
        paid.payment_status = Some("paid".to_string());
        let mut pending = order(5_000, 0, 0, false, None);
        pending.payment_status = Some("pending".to_string());
        let unknown = order(7_000, 0, 0, false, None);

        assert_eq!(
            collected_revenue(&[paid, pending, unknown]),
            Money::from_cents(10_000)
        );
    }
}
