//! # Output Rendering
//!
//! Every command returns a serializable value; this module prints it either
//! as JSON (camelCase, as the web console reads it) or as plain text tables.

use std::fmt::Write as _;

use serde::Serialize;
use tally_client::SpendingSummary;
use tally_core::promotion::StoreScope;
use tally_core::{DashboardStats, GeneralSetting, Money, Promotion, SalesReport};

use crate::cli::Format;
use crate::error::CliResult;

/// Renders `value` in the requested format.
pub fn render<T, F>(format: Format, value: &T, text: F) -> CliResult<String>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(value)?),
        Format::Text => Ok(text(value)),
    }
}

/// Display name for a payment method code.
///
/// The register stores either a numeric code or a named one.
pub fn payment_label(method: &str) -> &str {
    match method {
        "1" | "cash" => "Cash",
        "2" | "creditCard" | "card" => "Credit card",
        "3" | "transfer" | "bankTransfer" => "Bank transfer",
        "4" | "momo" => "MoMo",
        "5" | "zalopay" => "ZaloPay",
        "6" | "vnpay" => "VNPay",
        "7" | "qrCode" => "QR code",
        other => other,
    }
}

// =============================================================================
// Reports
// =============================================================================

pub fn dashboard_text(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let s = &stats.summary;
    let _ = writeln!(out, "Dashboard {}", stats.range);
    let _ = writeln!(out, "  Revenue            {:>16}", s.total_sales_revenue);
    let _ = writeln!(out, "  Orders             {:>16}", s.period_order_count);
    let _ = writeln!(out, "  Customers          {:>16}", s.period_customer_count);
    let _ = writeln!(out, "  Average order      {:>16}", s.average_order_value);
    let _ = writeln!(out, "  Daily average      {:>16}", s.daily_average_revenue);
    let _ = writeln!(out, "  Active orders      {:>16}", stats.active_orders);
    let _ = writeln!(out, "  Peak hour          {:>13}:00", stats.peak_hour);

    if !stats.hourly_orders.is_empty() {
        let _ = writeln!(out, "\nOrders by hour");
        for row in &stats.hourly_orders {
            let _ = writeln!(out, "  {:02}:00  {:>6}", row.hour, row.orders);
        }
    }

    if !stats.top_products.is_empty() {
        let _ = writeln!(out, "\nTop products");
        for row in &stats.top_products {
            let _ = writeln!(out, "  {:<30} {:>6} {:>16}", row.product_name, row.quantity, row.revenue);
        }
    }

    if !stats.top_customers.is_empty() {
        let _ = writeln!(out, "\nTop customers");
        for row in &stats.top_customers {
            let _ = writeln!(out, "  {:<30} {:>6} {:>16}", row.name, row.orders, row.total);
        }
    }
    out
}

pub fn sales_text(report: &SalesReport) -> String {
    let mut out = String::new();
    let s = &report.summary;
    let _ = writeln!(out, "Sales {}", report.range);
    let _ = writeln!(out, "  Revenue            {:>16}", s.total_sales_revenue);
    let _ = writeln!(out, "  Before tax         {:>16}", s.subtotal_revenue);
    let _ = writeln!(out, "  Orders             {:>16}", s.period_order_count);
    let _ = writeln!(out, "  Customers          {:>16}", s.period_customer_count);
    let _ = writeln!(out, "  Average order      {:>16}", s.average_order_value);
    let _ = writeln!(out, "  Peak hour          {:>13}:00", report.peak_hour);

    if !report.daily_sales.is_empty() {
        let _ = writeln!(out, "\nBy day");
        for row in &report.daily_sales {
            let _ = writeln!(
                out,
                "  {}  {:>16}  orders {:>4}  customers {:>4}  discount {:>12}",
                row.date, row.revenue, row.orders, row.customers, row.discount
            );
        }
    }

    if !report.payment_methods.is_empty() {
        let _ = writeln!(out, "\nBy payment method");
        for row in &report.payment_methods {
            let _ = writeln!(
                out,
                "  {:<16} {:>6} {:>16} {:>6.1}%",
                payment_label(&row.method),
                row.count,
                row.revenue,
                row.share_percent
            );
        }
    }

    if !report.hourly_sales.is_empty() {
        let _ = writeln!(out, "\nBy hour");
        for row in &report.hourly_sales {
            let _ = writeln!(out, "  {:02}:00  {:>16}", row.hour, row.revenue);
        }
    }

    if !report.top_products.is_empty() {
        let _ = writeln!(out, "\nTop products");
        for row in &report.top_products {
            let _ = writeln!(out, "  {:<30} {:>6} {:>16}", row.product_name, row.quantity, row.revenue);
        }
    }
    out
}

pub fn spending_text(summary: &SpendingSummary) -> String {
    let mut out = String::new();
    let r = &summary.report;
    let _ = writeln!(out, "Spending {}", summary.range);

    section(&mut out, "Raw materials", &r.raw_materials, r.total_raw_materials);
    let names = &summary.expense_categories;
    section(
        &mut out,
        names.management.as_deref().unwrap_or("Management expenses"),
        &r.management_expenses,
        r.total_management_expenses,
    );
    section(
        &mut out,
        names.fixed.as_deref().unwrap_or("Fixed expenses"),
        &r.fixed_expenses,
        r.total_fixed_expenses,
    );

    let _ = writeln!(out, "\nSupplier debt");
    for debt in &r.supplier_debts {
        let _ = writeln!(
            out,
            "  {:<30} owed {:>14}  paid {:>14}  due {:>14}",
            debt.supplier_name, debt.total_debt, debt.paid_expenses, debt.debt_amount
        );
    }
    let _ = writeln!(out, "  {:<30} {:>16}", "Total", r.total_supplier_debt);

    let _ = writeln!(out);
    let _ = writeln!(out, "Total spending       {:>16}", r.total_spending);
    let _ = writeln!(out, "Collected revenue    {:>16}", summary.collected_revenue);
    let _ = writeln!(out, "Net profit           {:>16}", summary.net_profit);
    if r.unclassified_items > 0 {
        let _ = writeln!(
            out,
            "({} expense line(s) matched no category and are not counted)",
            r.unclassified_items
        );
    }
    out
}

fn section(out: &mut String, title: &str, lines: &[tally_core::spending::SpendingLine], total: Money) {
    let _ = writeln!(out, "\n{}", title);
    for line in lines {
        let _ = writeln!(out, "  {:<30} {:>16}", line.name, line.total_value);
    }
    let _ = writeln!(out, "  {:<30} {:>16}", "Total", total);
}

// =============================================================================
// Admin Views
// =============================================================================

pub fn promotions_text(promotions: &[Promotion]) -> String {
    if promotions.is_empty() {
        return "No promotions\n".to_string();
    }

    let mut out = String::new();
    for promo in promotions {
        let window = match (promo.valid_from, promo.valid_to) {
            (Some(from), Some(to)) => format!("{} .. {}", from, to),
            (Some(from), None) => format!("from {}", from),
            (None, Some(to)) => format!("until {}", to),
            (None, None) => "always".to_string(),
        };
        let scope = match promo.store_scope() {
            StoreScope::AllStores => "all stores".to_string(),
            StoreScope::Stores(codes) => codes.join(", "),
        };
        let _ = writeln!(
            out,
            "{:<12} {:<30} {:>10} {:?}  {}  [{}]{}",
            promo.code,
            promo.name,
            promo.discount_value,
            promo.discount_value_type,
            window,
            scope,
            if promo.is_active { "" } else { "  (inactive)" }
        );
        for tier in promo.tiers() {
            let _ = writeln!(
                out,
                "{:<12}   from {:>14}: {} {:?}",
                "", tier.min_order_amount, tier.discount_value, tier.discount_value_type
            );
        }
    }
    out
}

pub fn settings_text(settings: &[GeneralSetting]) -> String {
    let mut out = String::new();
    for setting in settings {
        let _ = writeln!(
            out,
            "{:>6}  [{}]  {:<24} {}",
            setting.id,
            if setting.is_active { "on " } else { "off" },
            setting.setting_code,
            setting.setting_name
        );
    }
    out
}
