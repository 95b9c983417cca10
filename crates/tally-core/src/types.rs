//! # Domain Types
//!
//! Records the POS backend returns, as the reporting engine sees them.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Store ─────┬──── Order ──────── OrderItem ───── Product ── Category    │
//! │             │      │ paymentMethod: "1" | "[{method, amount}, ...]"     │
//! │             │                                                           │
//! │             ├──── PurchaseReceipt ──── ReceiptItem ──── Product         │
//! │             │      │ purchaseType: raw_materials | expenses | null      │
//! │             │      └── Supplier                                         │
//! │             │                                                           │
//! │             └──── ExpenseVoucher ──── Supplier                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every numeric and temporal field goes through [`crate::coerce`], so a
//! record with a malformed amount deserializes with that amount as zero
//! instead of failing the whole response.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::coerce;
use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Timestamp
// =============================================================================

/// A point in time as the backend wrote it.
///
/// Some endpoints send RFC 3339 with an offset, others a bare
/// `YYYY-MM-DD HH:MM:SS`. Zoned values are converted to the report's local
/// offset; naive values are taken as already local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl Timestamp {
    /// Parses any timestamp shape the backend is known to emit.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(Timestamp::Zoned(zoned));
        }
        if let Some(zoned) = ZONED_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
        {
            return Some(Timestamp::Zoned(zoned));
        }
        if let Some(naive) = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        {
            return Some(Timestamp::Naive(naive));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Timestamp::Naive)
    }

    /// Wall-clock time at the given UTC offset.
    pub fn local(&self, offset: &FixedOffset) -> NaiveDateTime {
        match self {
            Timestamp::Zoned(zoned) => zoned.with_timezone(offset).naive_local(),
            Timestamp::Naive(naive) => *naive,
        }
    }

    /// The calendar date exactly as written, ignoring any offset conversion.
    pub fn written_date(&self) -> NaiveDate {
        match self {
            Timestamp::Zoned(zoned) => zoned.date_naive(),
            Timestamp::Naive(naive) => naive.date(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Zoned(zoned) => write!(f, "{}", zoned.to_rfc3339()),
            Timestamp::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of a restaurant order.
///
/// ```text
/// pending → confirmed → preparing → ready → served → paid → completed
///   └──────────────── active ───────────────────┘    └─ settled ─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Paid,
    Completed,
    Cancelled,
    /// Anything the backend sends that this client does not know.
    #[default]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }

    /// Paid or completed: the orders revenue reports count.
    pub fn is_settled(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Completed)
    }

    /// Still on the floor: counted by the dashboard's active-orders tile.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Preparing
                | OrderStatus::Ready
                | OrderStatus::Served
        )
    }
}

impl FromStr for OrderStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "confirmed" => OrderStatus::Confirmed,
            "preparing" => OrderStatus::Preparing,
            "ready" => OrderStatus::Ready,
            "served" => OrderStatus::Served,
            "paid" => OrderStatus::Paid,
            "completed" => OrderStatus::Completed,
            "cancelled" | "canceled" => OrderStatus::Cancelled,
            _ => OrderStatus::Unknown,
        })
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Payment method assumed when an order records none.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// A customer order with its reconciled amounts.
///
/// ## Revenue Formulas
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  net_revenue()      priceIncludeTax ? subtotal − discount               │
/// │                                     : subtotal − discount + tax         │
/// │  pre_tax_revenue()  subtotal − discount                                 │
/// │  gross_sales()      subtotal + tax        (daily sales chart)           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "coerce::money")]
    pub subtotal: Money,
    #[serde(default, deserialize_with = "coerce::money")]
    pub discount: Money,
    #[serde(default, deserialize_with = "coerce::money")]
    pub tax: Money,
    #[serde(default, deserialize_with = "coerce::money")]
    pub total: Money,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub price_include_tax: bool,
    #[serde(default, deserialize_with = "coerce::optional_int")]
    pub customer_count: Option<i64>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub customer_name: Option<String>,
    /// Single method code, or a JSON array of `{method, amount}` portions.
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "coerce::timestamp")]
    pub ordered_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "coerce::timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub store_code: Option<String>,
}

impl Order {
    /// Net sales revenue, aware of tax-inclusive pricing.
    ///
    /// This is the single definition every report uses.
    pub fn net_revenue(&self) -> Money {
        if self.price_include_tax {
            self.subtotal - self.discount
        } else {
            self.subtotal - self.discount + self.tax
        }
    }

    /// Revenue net of discount, before tax.
    pub fn pre_tax_revenue(&self) -> Money {
        self.subtotal - self.discount
    }

    /// Subtotal plus tax, as charted per day on the sales report.
    pub fn gross_sales(&self) -> Money {
        self.subtotal + self.tax
    }

    /// Number of covers; unset or zero counts as one guest.
    pub fn customers(&self) -> i64 {
        match self.customer_count {
            Some(count) if count != 0 => count,
            _ => 1,
        }
    }

    /// When the order happened: `orderedAt`, else `createdAt`.
    pub fn occurred_at(&self) -> Option<&Timestamp> {
        self.ordered_at.as_ref().or(self.created_at.as_ref())
    }

    /// Local wall-clock time of the order at `offset`.
    pub fn local_time(&self, offset: &FixedOffset) -> Option<NaiveDateTime> {
        self.occurred_at().map(|ts| ts.local(offset))
    }

    /// Parsed payment method(s).
    pub fn payment_methods(&self) -> PaymentMethods {
        PaymentMethods::parse(self.payment_method.as_deref())
    }

    /// Whether the backend marked the bill as collected.
    pub fn is_paid(&self) -> bool {
        self.payment_status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("paid"))
    }
}

/// One line of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::id")]
    pub order_id: String,
    #[serde(default, deserialize_with = "coerce::id")]
    pub product_id: String,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::money")]
    pub unit_price: Money,
    #[serde(default, deserialize_with = "coerce::int")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "coerce::money")]
    pub discount: Money,
    #[serde(default, deserialize_with = "coerce::money")]
    pub total: Money,
}

// =============================================================================
// Payment Methods
// =============================================================================

/// One part of a split payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPortion {
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "coerce::money")]
    pub amount: Money,
}

impl PaymentPortion {
    /// Method code, defaulting to cash.
    pub fn method_or_default(&self) -> &str {
        self.method.as_deref().unwrap_or(DEFAULT_PAYMENT_METHOD)
    }
}

/// How an order was paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethods {
    /// One method code, used verbatim as the grouping key.
    Single(String),
    /// A non-empty list of portions; revenue is split by amount share.
    Split(Vec<PaymentPortion>),
}

impl PaymentMethods {
    /// Interprets a raw `paymentMethod` field.
    ///
    /// A JSON array with at least one element becomes [`PaymentMethods::Split`].
    /// Anything else (including `"[]"` and unparseable JSON) is a single code,
    /// and a missing field is cash.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return PaymentMethods::Single(DEFAULT_PAYMENT_METHOD.to_string());
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) if !entries.is_empty() => PaymentMethods::Split(
                entries
                    .into_iter()
                    .map(|entry| serde_json::from_value(entry).unwrap_or_default())
                    .collect(),
            ),
            _ => PaymentMethods::Single(raw.to_string()),
        }
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// What a purchase receipt was for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PurchaseType {
    /// `raw_materials`, empty, or absent.
    #[default]
    RawMaterials,
    /// Exactly `expenses`.
    Expenses,
    /// Any other tag; ignored by spending reconciliation.
    Other(String),
}

impl PurchaseType {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            None | Some("") | Some("raw_materials") => PurchaseType::RawMaterials,
            Some("expenses") => PurchaseType::Expenses,
            Some(other) => PurchaseType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PurchaseType::RawMaterials => "raw_materials",
            PurchaseType::Expenses => "expenses",
            PurchaseType::Other(tag) => tag,
        }
    }
}

impl Serialize for PurchaseType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PurchaseType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match &value {
            Value::Null => PurchaseType::RawMaterials,
            Value::String(tag) => PurchaseType::from_tag(Some(tag)),
            other => PurchaseType::Other(other.to_string()),
        })
    }
}

/// Supplier embedded in a purchase receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRef {
    #[serde(default, deserialize_with = "coerce::optional_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub name: Option<String>,
}

/// A goods-in or expense receipt from a supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub supplier: Option<SupplierRef>,
    #[serde(default, deserialize_with = "coerce::optional_id")]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub purchase_type: PurchaseType,
    #[serde(default, deserialize_with = "coerce::list")]
    pub items: Vec<ReceiptItem>,
    /// Only an explicit `false` marks the receipt as owed.
    #[serde(default, deserialize_with = "coerce::optional_flag")]
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub store_code: Option<String>,
}

impl PurchaseReceipt {
    /// Supplier id from the embedded supplier, else the flat column.
    pub fn supplier_key(&self) -> Option<&str> {
        self.supplier
            .as_ref()
            .and_then(|supplier| supplier.id.as_deref())
            .or(self.supplier_id.as_deref())
    }

    pub fn supplier_name(&self) -> Option<&str> {
        self.supplier.as_ref().and_then(|supplier| supplier.name.as_deref())
    }

    /// Σ item totals.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|item| item.total).sum()
    }

    pub fn is_unpaid(&self) -> bool {
        self.is_paid == Some(false)
    }
}

/// One line of a purchase receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    #[serde(default, deserialize_with = "coerce::optional_id")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::money")]
    pub total: Money,
    #[serde(default, deserialize_with = "coerce::money")]
    pub discount_amount: Money,
}

/// A payment made to a supplier outside a receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseVoucher {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub voucher_number: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_id")]
    pub supplier_id: Option<String>,
    /// Older vouchers carry the snake_case column instead.
    #[serde(default, rename = "supplier_id", deserialize_with = "coerce::optional_id")]
    pub legacy_supplier_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::money")]
    pub amount: Money,
    #[serde(default, deserialize_with = "coerce::timestamp")]
    pub date: Option<Timestamp>,
    #[serde(default, deserialize_with = "coerce::timestamp")]
    pub voucher_date: Option<Timestamp>,
    #[serde(default, deserialize_with = "coerce::timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub store_code: Option<String>,
}

impl ExpenseVoucher {
    pub fn supplier_key(&self) -> Option<&str> {
        self.supplier_id.as_deref().or(self.legacy_supplier_id.as_deref())
    }

    /// `date`, else `voucherDate`, else `createdAt`.
    pub fn effective_date(&self) -> Option<&Timestamp> {
        self.date
            .as_ref()
            .or(self.voucher_date.as_ref())
            .or(self.created_at.as_ref())
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog entry; only the classification codes matter to reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_int")]
    pub product_type: Option<i64>,
    #[serde(default, deserialize_with = "coerce::optional_int")]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub name: String,
}

/// User type of the admin pseudo-store, hidden from store pickers.
pub const ADMIN_STORE_TYPE: i64 = 1;

/// A store (branch) the operator can report on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub store_code: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub store_name: String,
    #[serde(default, deserialize_with = "coerce::optional_int")]
    pub type_user: Option<i64>,
}

impl Store {
    pub fn is_admin(&self) -> bool {
        self.type_user == Some(ADMIN_STORE_TYPE)
    }
}

/// A feature switch in the general settings screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSetting {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub setting_code: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub setting_name: String,
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub setting_value: Option<String>,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub is_active: bool,
}

// =============================================================================
// Store Filter
// =============================================================================

/// Which stores a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StoreFilter {
    #[default]
    All,
    Store(String),
}

impl StoreFilter {
    /// Wire value meaning every store.
    pub const ALL: &'static str = "all";

    /// Query parameter value.
    pub fn as_param(&self) -> &str {
        match self {
            StoreFilter::All => Self::ALL,
            StoreFilter::Store(code) => code,
        }
    }

    /// Store code to send where the backend wants it omitted for "all".
    pub fn store_code(&self) -> Option<&str> {
        match self {
            StoreFilter::All => None,
            StoreFilter::Store(code) => Some(code),
        }
    }

    /// Whether a record with `store_code` belongs in the report.
    pub fn matches(&self, store_code: Option<&str>) -> bool {
        match self {
            StoreFilter::All => true,
            StoreFilter::Store(code) => store_code == Some(code.as_str()),
        }
    }
}

impl FromStr for StoreFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidStoreFilter(s.to_string()));
        }
        if trimmed.eq_ignore_ascii_case(Self::ALL) {
            Ok(StoreFilter::All)
        } else {
            Ok(StoreFilter::Store(trimmed.to_string()))
        }
    }
}

impl fmt::Display for StoreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl Serialize for StoreFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_param())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn order(subtotal: i64, discount: i64, tax: i64, include_tax: bool) -> Order {
        Order {
            subtotal: Money::from_cents(subtotal),
            discount: Money::from_cents(discount),
            tax: Money::from_cents(tax),
            price_include_tax: include_tax,
            ..Default::default()
        }
    }

    #[test]
    fn test_net_revenue_respects_tax_inclusion() {
        assert_eq!(order(10000, 1000, 800, false).net_revenue(), Money::from_cents(9800));
        assert_eq!(order(10000, 1000, 800, true).net_revenue(), Money::from_cents(9000));
        assert_eq!(order(10000, 1000, 800, false).pre_tax_revenue(), Money::from_cents(9000));
        assert_eq!(order(10000, 1000, 800, false).gross_sales(), Money::from_cents(10800));
    }

    #[test]
    fn test_order_deserializes_loose_backend_json() {
        let order: Order = serde_json::from_value(json!({
            "id": 42,
            "status": "PAID",
            "subtotal": "150000.00",
            "discount": null,
            "tax": 12000,
            "total": "abc",
            "priceIncludeTax": "yes",
            "customerCount": "3",
            "paymentMethod": [{"method": "cash", "amount": 100}],
            "orderedAt": "not a date",
            "createdAt": "2024-03-10T08:15:00Z",
            "storeCode": "S01"
        }))
        .unwrap();

        assert_eq!(order.id, "42");
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.subtotal, Money::from_cents(15_000_000));
        assert_eq!(order.discount, Money::zero());
        assert_eq!(order.tax, Money::from_cents(1_200_000));
        assert_eq!(order.total, Money::zero());
        assert!(!order.price_include_tax);
        assert_eq!(order.customers(), 3);
        assert!(matches!(order.payment_methods(), PaymentMethods::Split(ref p) if p.len() == 1));
        assert!(order.ordered_at.is_none());
        assert!(order.occurred_at().is_some());
    }

    #[test]
    fn test_unknown_status_does_not_fail() {
        let order: Order = serde_json::from_value(json!({"status": "refunded"})).unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
        let order: Order = serde_json::from_value(json!({"status": 3})).unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
    }

    #[test]
    fn test_customer_count_defaults_to_one() {
        let mut o = Order::default();
        assert_eq!(o.customers(), 1);
        o.customer_count = Some(0);
        assert_eq!(o.customers(), 1);
        o.customer_count = Some(4);
        assert_eq!(o.customers(), 4);
    }

    #[test]
    fn test_status_groups() {
        assert!(OrderStatus::Paid.is_settled());
        assert!(OrderStatus::Completed.is_settled());
        assert!(!OrderStatus::Served.is_settled());
        assert!(OrderStatus::Served.is_active());
        assert!(OrderStatus::Pending.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    #[test]
    fn test_payment_methods_parse() {
        assert_eq!(PaymentMethods::parse(None), PaymentMethods::Single("cash".to_string()));
        assert_eq!(PaymentMethods::parse(Some("2")), PaymentMethods::Single("2".to_string()));
        assert_eq!(PaymentMethods::parse(Some("[]")), PaymentMethods::Single("[]".to_string()));
        assert_eq!(
            PaymentMethods::parse(Some("[{broken")),
            PaymentMethods::Single("[{broken".to_string())
        );

        let split = PaymentMethods::parse(Some(r#"[{"method":"card","amount":"40"},{"amount":60}]"#));
        let PaymentMethods::Split(portions) = split else {
            panic!("expected a split payment");
        };
        assert_eq!(portions[0].method_or_default(), "card");
        assert_eq!(portions[0].amount, Money::from_cents(4000));
        assert_eq!(portions[1].method_or_default(), "cash");
    }

    #[test]
    fn test_timestamp_parse_and_local() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();

        let zoned = Timestamp::parse("2024-03-10T20:30:00Z").unwrap();
        let local = zoned.local(&offset);
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(local.hour(), 3);
        assert_eq!(zoned.written_date(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        let postgres = Timestamp::parse("2024-03-10 08:15:00+00").unwrap();
        assert_eq!(postgres.local(&offset).hour(), 15);

        let naive = Timestamp::parse("2024-03-10 08:15:00").unwrap();
        assert_eq!(naive.local(&offset).hour(), 8);

        let date_only = Timestamp::parse("2024-03-10").unwrap();
        assert_eq!(date_only.local(&offset).hour(), 0);

        assert!(Timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_purchase_type_tags() {
        let receipt: PurchaseReceipt = serde_json::from_value(json!({"purchaseType": null})).unwrap();
        assert_eq!(receipt.purchase_type, PurchaseType::RawMaterials);
        let receipt: PurchaseReceipt = serde_json::from_value(json!({"purchaseType": ""})).unwrap();
        assert_eq!(receipt.purchase_type, PurchaseType::RawMaterials);
        let receipt: PurchaseReceipt = serde_json::from_value(json!({})).unwrap();
        assert_eq!(receipt.purchase_type, PurchaseType::RawMaterials);
        let receipt: PurchaseReceipt =
            serde_json::from_value(json!({"purchaseType": "expenses"})).unwrap();
        assert_eq!(receipt.purchase_type, PurchaseType::Expenses);
        let receipt: PurchaseReceipt =
            serde_json::from_value(json!({"purchaseType": "assets"})).unwrap();
        assert_eq!(receipt.purchase_type, PurchaseType::Other("assets".to_string()));
    }

    #[test]
    fn test_receipt_supplier_key_and_paid_flag() {
        let receipt: PurchaseReceipt = serde_json::from_value(json!({
            "supplier": {"id": 9, "name": "Fresh Farm"},
            "supplierId": 3,
            "items": null,
            "isPaid": false
        }))
        .unwrap();
        assert_eq!(receipt.supplier_key(), Some("9"));
        assert_eq!(receipt.supplier_name(), Some("Fresh Farm"));
        assert!(receipt.items.is_empty());
        assert!(receipt.is_unpaid());

        let receipt: PurchaseReceipt =
            serde_json::from_value(json!({"supplierId": 3, "isPaid": 0})).unwrap();
        assert_eq!(receipt.supplier_key(), Some("3"));
        assert!(!receipt.is_unpaid());
    }

    #[test]
    fn test_voucher_date_fallback_and_snake_case_supplier() {
        let voucher: ExpenseVoucher = serde_json::from_value(json!({
            "supplier_id": 5,
            "amount": "300000",
            "voucherDate": "2024-03-05",
            "createdAt": "2024-03-09T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(voucher.supplier_key(), Some("5"));
        assert_eq!(
            voucher.effective_date().map(|ts| ts.written_date()),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn test_store_filter() {
        assert_eq!("all".parse::<StoreFilter>().unwrap(), StoreFilter::All);
        assert_eq!("ALL".parse::<StoreFilter>().unwrap(), StoreFilter::All);
        let filter: StoreFilter = "S01".parse().unwrap();
        assert!(filter.matches(Some("S01")));
        assert!(!filter.matches(Some("S02")));
        assert!(!filter.matches(None));
        assert!(StoreFilter::All.matches(None));
        assert_eq!(filter.store_code(), Some("S01"));
        assert!("  ".parse::<StoreFilter>().is_err());
    }

    #[test]
    fn test_admin_store() {
        let store: Store = serde_json::from_value(json!({"storeCode": "HQ", "typeUser": "1"})).unwrap();
        assert!(store.is_admin());
    }
}
