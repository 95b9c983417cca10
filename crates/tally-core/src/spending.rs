//! # Spending Reconciliation
//!
//! Classifies purchase-receipt lines into spending buckets and nets what each
//! supplier is owed against the vouchers already paid out.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receipt.purchaseType                                                   │
//! │     │                                                                   │
//! │     ├── raw_materials / "" / null ──► Raw materials (by product name)   │
//! │     │                                                                   │
//! │     ├── expenses ──► look up product                                    │
//! │     │                  ├── type 4, category 15 ──► Management expenses  │
//! │     │                  ├── type 4, category 17 ──► Fixed expenses       │
//! │     │                  └── anything else / not found ──► dropped        │
//! │     │                                                                   │
//! │     └── any other tag ──► dropped                                       │
//! │                                                                         │
//! │  Dropped lines never reach a total; they are only counted.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Supplier Debt
//! ```text
//! totalDebt    = Σ item totals of receipts with isPaid == false
//! paidExpenses = Σ vouchers in range (and store, unless "all")
//! debtAmount   = totalDebt − paidExpenses   → reported only when > 0
//! ```
//!
//! Every bucket is keyed, so the result is the same for any ordering of the
//! receipts, their items, or the vouchers.

use std::collections::{BTreeMap, HashMap};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::date_range::DateRange;
use crate::money::Money;
use crate::types::{
    Category, ExpenseVoucher, Product, PurchaseReceipt, PurchaseType, StoreFilter, Supplier,
};

/// `productType` of catalog entries that represent expenses.
pub const EXPENSE_PRODUCT_TYPE: i64 = 4;
/// `categoryId` of management expenses.
pub const MANAGEMENT_EXPENSE_CATEGORY: i64 = 15;
/// `categoryId` of fixed expenses.
pub const FIXED_EXPENSE_CATEGORY: i64 = 17;
/// Label for lines and suppliers without a name.
pub const UNKNOWN_LABEL: &str = "Unknown";

// =============================================================================
// Classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseClass {
    Management,
    Fixed,
}

/// Expense bucket of a catalog product, if it has one.
pub fn classify_expense(product: &Product) -> Option<ExpenseClass> {
    match (product.product_type, product.category_id) {
        (Some(EXPENSE_PRODUCT_TYPE), Some(MANAGEMENT_EXPENSE_CATEGORY)) => Some(ExpenseClass::Management),
        (Some(EXPENSE_PRODUCT_TYPE), Some(FIXED_EXPENSE_CATEGORY)) => Some(ExpenseClass::Fixed),
        _ => None,
    }
}

/// Catalog names of the two expense categories, when the backend lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseCategoryNames {
    pub management: Option<String>,
    pub fixed: Option<String>,
}

impl ExpenseCategoryNames {
    pub fn from_catalog(categories: &[Category]) -> Self {
        let name_of = |wanted: i64| {
            categories
                .iter()
                .find(|category| category.id.trim().parse::<i64>().ok() == Some(wanted))
                .map(|category| category.name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        };
        Self {
            management: name_of(MANAGEMENT_EXPENSE_CATEGORY),
            fixed: name_of(FIXED_EXPENSE_CATEGORY),
        }
    }
}

// =============================================================================
// Report Types
// =============================================================================

/// One named line of a spending bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SpendingLine {
    pub name: String,
    pub total_value: Money,
}

/// What one supplier is still owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierDebt {
    pub supplier_id: Option<String>,
    pub supplier_name: String,
    pub total_debt: Money,
    pub paid_expenses: Money,
    pub debt_amount: Money,
}

/// The four sections of the spending report plus totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SpendingReport {
    pub raw_materials: Vec<SpendingLine>,
    pub management_expenses: Vec<SpendingLine>,
    pub fixed_expenses: Vec<SpendingLine>,
    pub supplier_debts: Vec<SupplierDebt>,
    pub total_raw_materials: Money,
    pub total_management_expenses: Money,
    pub total_fixed_expenses: Money,
    pub total_supplier_debt: Money,
    /// Raw materials + management + fixed. Supplier debt is not spending.
    pub total_spending: Money,
    /// Expense lines that matched no bucket.
    pub unclassified_items: i64,
}

impl SpendingReport {
    /// Collected revenue minus total spending.
    pub fn net_profit(&self, collected_revenue: Money) -> Money {
        collected_revenue - self.total_spending
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Snapshots the reconciliation reads.
#[derive(Debug, Clone, Copy)]
pub struct SpendingSources<'a> {
    pub receipts: &'a [PurchaseReceipt],
    pub products: &'a [Product],
    pub vouchers: &'a [ExpenseVoucher],
    pub suppliers: &'a [Supplier],
}

/// Filters applied to vouchers.
///
/// Receipts arrive already filtered by the backend query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingFilter {
    pub range: DateRange,
    pub store: StoreFilter,
    pub offset: FixedOffset,
}

impl SpendingFilter {
    /// A voucher without any date passes the date check.
    pub fn accepts(&self, voucher: &ExpenseVoucher) -> bool {
        let in_range = voucher
            .effective_date()
            .map_or(true, |ts| self.range.contains(ts.local(&self.offset).date()));
        in_range && self.store.matches(voucher.store_code.as_deref())
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

#[derive(Default)]
struct DebtAccumulator {
    name: Option<String>,
    total_debt: Money,
    paid_expenses: Money,
}

/// Builds the spending report from receipt, catalog and voucher snapshots.
///
/// ## Example
/// ```rust
/// use chrono::{FixedOffset, NaiveDate};
/// use tally_core::date_range::DateRange;
/// use tally_core::money::Money;
/// use tally_core::spending::{reconcile_spending, SpendingFilter, SpendingSources};
/// use tally_core::types::{PurchaseReceipt, ReceiptItem, StoreFilter};
///
/// let receipt = PurchaseReceipt {
///     items: vec![ReceiptItem {
///         product_name: Some("Rice".into()),
///         total: Money::from_cents(50_000),
///         ..Default::default()
///     }],
///     ..Default::default()
/// };
/// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let filter = SpendingFilter {
///     range: DateRange::single(day),
///     store: StoreFilter::All,
///     offset: FixedOffset::east_opt(0).unwrap(),
/// };
/// let sources = SpendingSources { receipts: &[receipt], products: &[], vouchers: &[], suppliers: &[] };
/// let report = reconcile_spending(&sources, &filter);
/// assert_eq!(report.total_raw_materials, Money::from_cents(50_000));
/// ```
pub fn reconcile_spending(sources: &SpendingSources<'_>, filter: &SpendingFilter) -> SpendingReport {
    let products: HashMap<&str, &Product> = sources
        .products
        .iter()
        .map(|product| (product.id.as_str(), product))
        .collect();

    let mut raw_materials: BTreeMap<String, Money> = BTreeMap::new();
    let mut management: BTreeMap<String, Money> = BTreeMap::new();
    let mut fixed: BTreeMap<String, Money> = BTreeMap::new();
    let mut debts: BTreeMap<Option<String>, DebtAccumulator> = BTreeMap::new();
    let mut unclassified_items = 0;

    for receipt in sources.receipts {
        match &receipt.purchase_type {
            PurchaseType::RawMaterials => {
                for item in &receipt.items {
                    *raw_materials.entry(line_name(item.product_name.as_deref())).or_default() += item.total;
                }
            }
            PurchaseType::Expenses => {
                for item in &receipt.items {
                    let class = item
                        .product_id
                        .as_deref()
                        .and_then(|id| products.get(id))
                        .and_then(|product| classify_expense(product));
                    let bucket = match class {
                        Some(ExpenseClass::Management) => &mut management,
                        Some(ExpenseClass::Fixed) => &mut fixed,
                        None => {
                            unclassified_items += 1;
                            continue;
                        }
                    };
                    *bucket.entry(line_name(item.product_name.as_deref())).or_default() += item.total;
                }
            }
            PurchaseType::Other(_) => unclassified_items += receipt.items.len() as i64,
        }

        let debt = debts.entry(receipt.supplier_key().map(str::to_string)).or_default();
        if debt.name.is_none() {
            debt.name = receipt.supplier_name().map(str::to_string);
        }
        if receipt.is_unpaid() {
            debt.total_debt += receipt.items_total();
        }
    }

    for voucher in sources.vouchers.iter().filter(|v| filter.accepts(v)) {
        let Some(supplier_id) = voucher.supplier_key() else {
            continue;
        };
        debts.entry(Some(supplier_id.to_string())).or_default().paid_expenses += voucher.amount;
    }

    let supplier_names: HashMap<&str, &str> = sources
        .suppliers
        .iter()
        .map(|supplier| (supplier.id.as_str(), supplier.name.as_str()))
        .collect();

    let mut supplier_debts: Vec<SupplierDebt> = debts
        .into_iter()
        .filter_map(|(supplier_id, debt)| {
            let debt_amount = debt.total_debt - debt.paid_expenses;
            if !debt_amount.is_positive() {
                return None;
            }
            let supplier_name = debt
                .name
                .or_else(|| {
                    supplier_id
                        .as_deref()
                        .and_then(|id| supplier_names.get(id))
                        .filter(|name| !name.is_empty())
                        .map(|name| name.to_string())
                })
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
            Some(SupplierDebt {
                supplier_id,
                supplier_name,
                total_debt: debt.total_debt,
                paid_expenses: debt.paid_expenses,
                debt_amount,
            })
        })
        .collect();
    supplier_debts.sort_by(|a, b| {
        b.debt_amount
            .cmp(&a.debt_amount)
            .then_with(|| a.supplier_name.cmp(&b.supplier_name))
    });

    let raw_materials = into_lines(raw_materials);
    let management_expenses = into_lines(management);
    let fixed_expenses = into_lines(fixed);

    let total_raw_materials = sum_lines(&raw_materials);
    let total_management_expenses = sum_lines(&management_expenses);
    let total_fixed_expenses = sum_lines(&fixed_expenses);

    SpendingReport {
        total_supplier_debt: supplier_debts.iter().map(|d| d.debt_amount).sum(),
        total_spending: total_raw_materials + total_management_expenses + total_fixed_expenses,
        raw_materials,
        management_expenses,
        fixed_expenses,
        supplier_debts,
        total_raw_materials,
        total_management_expenses,
        total_fixed_expenses,
        unclassified_items,
    }
}

fn line_name(name: Option<&str>) -> String {
    name.unwrap_or(UNKNOWN_LABEL).to_string()
}

fn into_lines(bucket: BTreeMap<String, Money>) -> Vec<SpendingLine> {
    bucket
        .into_iter()
        .map(|(name, total_value)| SpendingLine { name, total_value })
        .collect()
}

fn sum_lines(lines: &[SpendingLine]) -> Money {
    lines.iter().map(|line| line.total_value).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReceiptItem, SupplierRef, Timestamp};
    use chrono::NaiveDate;

    fn march() -> SpendingFilter {
        SpendingFilter {
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            ),
            store: StoreFilter::All,
            offset: FixedOffset::east_opt(7 * 3600).unwrap(),
        }
    }

    fn item(product_id: &str, name: &str, total: i64) -> ReceiptItem {
        ReceiptItem {
            product_id: Some(product_id.to_string()),
            product_name: Some(name.to_string()),
            total: Money::from_cents(total),
            ..Default::default()
        }
    }

    fn receipt(kind: PurchaseType, items: Vec<ReceiptItem>) -> PurchaseReceipt {
        PurchaseReceipt {
            purchase_type: kind,
            items,
            ..Default::default()
        }
    }

    fn product(id: &str, product_type: i64, category_id: i64) -> Product {
        Product {
            id: id.to_string(),
            product_type: Some(product_type),
            category_id: Some(category_id),
            ..Default::default()
        }
    }

    fn unpaid_from(supplier: &str, total: i64) -> PurchaseReceipt {
        PurchaseReceipt {
            supplier: Some(SupplierRef {
                id: Some(supplier.to_string()),
                name: Some(format!("Supplier {supplier}")),
            }),
            items: vec![item("raw", "Flour", total)],
            is_paid: Some(false),
            ..Default::default()
        }
    }

    fn voucher(supplier: &str, amount: i64, date: &str) -> ExpenseVoucher {
        ExpenseVoucher {
            supplier_id: Some(supplier.to_string()),
            amount: Money::from_cents(amount),
            date: Timestamp::parse(date),
            ..Default::default()
        }
    }

    fn run(receipts: &[PurchaseReceipt], products: &[Product], vouchers: &[ExpenseVoucher]) -> SpendingReport {
        let sources = SpendingSources {
            receipts,
            products,
            vouchers,
            suppliers: &[],
        };
        reconcile_spending(&sources, &march())
    }

    #[test]
    fn test_classify_expense() {
        assert_eq!(classify_expense(&product("a", 4, 15)), Some(ExpenseClass::Management));
        assert_eq!(classify_expense(&product("a", 4, 17)), Some(ExpenseClass::Fixed));
        assert_eq!(classify_expense(&product("a", 4, 16)), None);
        assert_eq!(classify_expense(&product("a", 1, 15)), None);
        assert_eq!(classify_expense(&Product::default()), None);
    }

    #[test]
    fn test_raw_materials_grouped_by_name() {
        let receipts = vec![
            receipt(PurchaseType::RawMaterials, vec![item("1", "Rice", 1_000), item("2", "Fish", 500)]),
            receipt(PurchaseType::RawMaterials, vec![item("1", "Rice", 2_000)]),
            receipt(
                PurchaseType::RawMaterials,
                vec![ReceiptItem {
                    total: Money::from_cents(70),
                    ..Default::default()
                }],
            ),
        ];
        let report = run(&receipts, &[], &[]);
        assert_eq!(
            report.raw_materials,
            vec![
                SpendingLine { name: "Fish".into(), total_value: Money::from_cents(500) },
                SpendingLine { name: "Rice".into(), total_value: Money::from_cents(3_000) },
                SpendingLine { name: UNKNOWN_LABEL.into(), total_value: Money::from_cents(70) },
            ]
        );
        assert_eq!(report.total_raw_materials, Money::from_cents(3_570));
        assert_eq!(report.total_spending, Money::from_cents(3_570));
    }

    #[test]
    fn test_management_expense_lands_only_in_management() {
        let products = vec![product("rent", 4, 17), product("office", 4, 15)];
        let expense_items = vec![item("office", "Stationery", 400), item("rent", "Rent", 9_000)];
        let raw = receipt(PurchaseType::RawMaterials, vec![item("x", "Salt", 100)]);
        let expenses = receipt(PurchaseType::Expenses, expense_items.clone());

        let mut reversed_items = expense_items;
        reversed_items.reverse();
        let orderings = vec![
            vec![raw.clone(), expenses.clone()],
            vec![expenses.clone(), raw.clone()],
            vec![receipt(PurchaseType::Expenses, reversed_items), raw],
        ];

        for receipts in orderings {
            let report = run(&receipts, &products, &[]);
            assert_eq!(report.total_management_expenses, Money::from_cents(400));
            assert_eq!(report.management_expenses[0].name, "Stationery");
            assert_eq!(report.total_fixed_expenses, Money::from_cents(9_000));
            assert_eq!(report.total_raw_materials, Money::from_cents(100));
            assert!(report.raw_materials.iter().all(|line| line.name != "Stationery"));
            assert!(report.fixed_expenses.iter().all(|line| line.name != "Stationery"));
            assert_eq!(report.total_spending, Money::from_cents(9_500));
        }
    }

    #[test]
    fn test_unmatched_expenses_are_dropped_and_counted() {
        let products = vec![product("misc", 4, 16), product("food", 1, 15)];
        let receipts = vec![
            receipt(
                PurchaseType::Expenses,
                vec![item("misc", "Misc", 100), item("food", "Food", 200), item("ghost", "Ghost", 300)],
            ),
            receipt(PurchaseType::Other("assets".into()), vec![item("x", "Oven", 5_000)]),
        ];
        let report = run(&receipts, &products, &[]);
        assert_eq!(report.total_spending, Money::zero());
        assert!(report.management_expenses.is_empty());
        assert!(report.fixed_expenses.is_empty());
        assert!(report.raw_materials.is_empty());
        assert_eq!(report.unclassified_items, 4);
    }

    #[test]
    fn test_supplier_fully_paid_is_excluded() {
        let report = run(
            &[unpaid_from("7", 50_000_000)],
            &[],
            &[voucher("7", 50_000_000, "2024-03-10")],
        );
        assert!(report.supplier_debts.is_empty());
        assert_eq!(report.total_supplier_debt, Money::zero());
    }

    #[test]
    fn test_supplier_partially_paid_is_included() {
        let report = run(
            &[unpaid_from("7", 50_000_000)],
            &[],
            &[voucher("7", 30_000_000, "2024-03-10")],
        );
        assert_eq!(report.supplier_debts.len(), 1);
        let debt = &report.supplier_debts[0];
        assert_eq!(debt.supplier_name, "Supplier 7");
        assert_eq!(debt.total_debt, Money::from_cents(50_000_000));
        assert_eq!(debt.paid_expenses, Money::from_cents(30_000_000));
        assert_eq!(debt.debt_amount, Money::from_cents(20_000_000));
        assert_eq!(report.total_supplier_debt, Money::from_cents(20_000_000));
        // Debt is not spending.
        assert_eq!(report.total_spending, Money::from_cents(50_000_000));
    }

    #[test]
    fn test_paid_receipts_create_no_debt() {
        let mut paid = unpaid_from("7", 1_000);
        paid.is_paid = Some(true);
        let mut unknown = unpaid_from("8", 1_000);
        unknown.is_paid = None;
        let report = run(&[paid, unknown], &[], &[]);
        assert!(report.supplier_debts.is_empty());
    }

    #[test]
    fn test_vouchers_outside_range_or_store_do_not_count() {
        let receipts = [unpaid_from("7", 1_000)];
        let mut other_store = voucher("7", 1_000, "2024-03-10");
        other_store.store_code = Some("S02".into());
        let vouchers = [voucher("7", 1_000, "2024-04-01T10:00:00+07:00"), other_store];

        let sources = SpendingSources {
            receipts: &receipts,
            products: &[],
            vouchers: &vouchers,
            suppliers: &[],
        };
        let mut filter = march();
        filter.store = StoreFilter::Store("S01".into());
        let report = reconcile_spending(&sources, &filter);
        assert_eq!(report.supplier_debts[0].paid_expenses, Money::zero());

        filter.store = StoreFilter::All;
        let report = reconcile_spending(&sources, &filter);
        assert!(report.supplier_debts.is_empty());
    }

    #[test]
    fn test_undated_voucher_passes_date_check() {
        let mut undated = voucher("7", 400, "");
        undated.date = None;
        let report = run(&[unpaid_from("7", 1_000)], &[], &[undated]);
        assert_eq!(report.supplier_debts[0].debt_amount, Money::from_cents(600));
    }

    #[test]
    fn test_supplier_name_from_supplier_list() {
        let receipts = [PurchaseReceipt {
            supplier_id: Some("9".into()),
            items: vec![item("raw", "Flour", 1_000)],
            is_paid: Some(false),
            ..Default::default()
        }];
        let suppliers = [Supplier {
            id: "9".into(),
            name: "Green Valley".into(),
        }];
        let sources = SpendingSources {
            receipts: &receipts,
            products: &[],
            vouchers: &[],
            suppliers: &suppliers,
        };
        let report = reconcile_spending(&sources, &march());
        assert_eq!(report.supplier_debts[0].supplier_name, "Green Valley");
    }

    #[test]
    fn test_net_profit() {
        let report = run(&[receipt(PurchaseType::RawMaterials, vec![item("1", "Rice", 3_000)])], &[], &[]);
        assert_eq!(report.net_profit(Money::from_cents(10_000)), Money::from_cents(7_000));
    }

    #[test]
    fn test_expense_category_names() {
        let categories = vec![
            Category { id: "15".into(), name: " Office & admin ".into() },
            Category { id: "17".into(), name: "".into() },
            Category { id: "3".into(), name: "Drinks".into() },
        ];
        let names = ExpenseCategoryNames::from_catalog(&categories);
        assert_eq!(names.management.as_deref(), Some("Office & admin"));
        assert_eq!(names.fixed, None);
        assert_eq!(ExpenseCategoryNames::from_catalog(&[]), ExpenseCategoryNames::default());
    }

    #[test]
    fn test_recomputation_is_identical() {
        let products = vec![product("office", 4, 15)];
        let receipts = vec![
            receipt(PurchaseType::Expenses, vec![item("office", "Paper", 100)]),
            unpaid_from("3", 900),
        ];
        let vouchers = vec![voucher("3", 100, "2024-03-03")];
        assert_eq!(run(&receipts, &products, &vouchers), run(&receipts, &products, &vouchers));
    }
}
