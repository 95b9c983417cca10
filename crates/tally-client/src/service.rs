//! # Report Service
//!
//! Fetches the snapshots each report needs and hands them to `tally-core`.
//!
//! ## Report Dependencies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Report Dependencies                              │
//! │                                                                         │
//! │  dashboard ──┬── orders (range, store)                                  │
//! │              ├── orders (today, store)     ── active-orders tile        │
//! │              └── order items (range)                                    │
//! │                                                                         │
//! │  sales ──────┬── orders (range, store)                                  │
//! │              └── order items (range)                                    │
//! │                                                                         │
//! │  spending ───┬── purchase receipts (range, store)                       │
//! │              ├── expense vouchers (range, store)                        │
//! │              ├── products · suppliers · categories                      │
//! │              └── orders (range, store)     ── collected revenue         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every dependency sits in its own [`QuerySlot`]. Independent dependencies
//! load concurrently; a report is computed only once all of them are ready.
//! A failed dependency stays failed (without refetching) until
//! [`ReportService::retry`].

use std::future::Future;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use tally_core::reports::{DashboardSources, SalesSources};
use tally_core::revenue::collected_revenue;
use tally_core::spending::{
    reconcile_spending, ExpenseCategoryNames, SpendingFilter, SpendingSources,
};
use tally_core::{
    Category, DashboardStats, DateRange, ExpenseVoucher, Money, Order, OrderItem, Product,
    PurchaseReceipt, SalesReport, SpendingReport, Store, StoreFilter, Supplier,
};
use tracing::info;

use crate::api::{OrderQuery, PosApi, SpendingQuery};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::query::{QueryKey, QuerySlot, ViewStatus};
use crate::session::Session;
use crate::transport::{Transport, TransportConfig};

/// Spending report plus the revenue it is netted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub range: DateRange,
    #[serde(flatten)]
    pub report: SpendingReport,
    pub collected_revenue: Money,
    pub net_profit: Money,
    /// Titles for the management and fixed expense sections.
    pub expense_categories: ExpenseCategoryNames,
}

/// Memoized report pipeline over one backend.
#[derive(Debug)]
pub struct ReportService {
    api: PosApi,
    offset: FixedOffset,
    top_n: usize,
    period_orders: QuerySlot<Vec<Order>>,
    current_orders: QuerySlot<Vec<Order>>,
    order_items: QuerySlot<Vec<OrderItem>>,
    receipts: QuerySlot<Vec<PurchaseReceipt>>,
    vouchers: QuerySlot<Vec<ExpenseVoucher>>,
    products: QuerySlot<Vec<Product>>,
    suppliers: QuerySlot<Vec<Supplier>>,
    categories: QuerySlot<Vec<Category>>,
    stores: QuerySlot<Vec<Store>>,
}

impl ReportService {
    pub fn new(api: PosApi, offset: FixedOffset, top_n: usize) -> Self {
        ReportService {
            api,
            offset,
            top_n,
            period_orders: QuerySlot::new("period_orders"),
            current_orders: QuerySlot::new("current_orders"),
            order_items: QuerySlot::new("order_items"),
            receipts: QuerySlot::new("purchase_receipts"),
            vouchers: QuerySlot::new("expense_vouchers"),
            products: QuerySlot::new("products"),
            suppliers: QuerySlot::new("suppliers"),
            categories: QuerySlot::new("categories"),
            stores: QuerySlot::new("stores"),
        }
    }

    /// Wires session, transport and endpoints from configuration.
    ///
    /// The persisted token is loaded first; a token from the environment
    /// takes precedence for this process without being written back.
    pub async fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let session = match config.token_path() {
            Some(path) => Session::load(path)?,
            None => Session::new(),
        };
        if let Some(token) = &config.session.token {
            session.override_token(token.clone()).await;
        }

        let transport = Transport::new(TransportConfig::from_client_config(config)?, Arc::new(session))?;
        info!(base_url = %transport.base_url(), "Report service ready");

        Ok(Self::new(
            PosApi::new(transport),
            config.utc_offset()?,
            config.report.top_n,
        ))
    }

    pub fn api(&self) -> &PosApi {
        &self.api
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Dashboard for `range`. `today` feeds the active-orders tile.
    pub async fn dashboard(&self, range: DateRange, store: &StoreFilter, today: NaiveDate) -> ClientResult<DashboardStats> {
        let period = OrderQuery::new(range, store.clone());
        let current = OrderQuery::new(DateRange::single(today), store.clone());

        let (period_orders, current_orders, items) = tokio::join!(
            load(&self.period_orders, period.key(), || self.api.orders(&period)),
            load(&self.current_orders, current.key(), || self.api.orders(&current)),
            load(&self.order_items, PosApi::order_items_key(&range), || self.api.order_items(&range)),
        );
        let (period_orders, current_orders, items) = (period_orders?, current_orders?, items?);

        let sources = DashboardSources {
            period_orders: &period_orders,
            items: &items,
            current_orders: &current_orders,
            store,
        };
        let stats = DashboardStats::compute(&sources, &range, &self.offset, self.top_n);
        info!(
            %range,
            %store,
            orders = stats.summary.period_order_count,
            revenue = %stats.summary.total_sales_revenue,
            "Dashboard computed"
        );
        Ok(stats)
    }

    pub async fn sales(&self, range: DateRange, store: &StoreFilter) -> ClientResult<SalesReport> {
        let query = OrderQuery::new(range, store.clone());

        let (orders, items) = tokio::join!(
            load(&self.period_orders, query.key(), || self.api.orders(&query)),
            load(&self.order_items, PosApi::order_items_key(&range), || self.api.order_items(&range)),
        );
        let (orders, items) = (orders?, items?);

        let sources = SalesSources {
            orders: &orders,
            items: &items,
        };
        let report = SalesReport::compute(&sources, &range, &self.offset, self.top_n);
        info!(
            %range,
            %store,
            orders = report.summary.period_order_count,
            revenue = %report.summary.total_sales_revenue,
            "Sales report computed"
        );
        Ok(report)
    }

    pub async fn spending(&self, range: DateRange, store: &StoreFilter) -> ClientResult<SpendingSummary> {
        let spending = SpendingQuery {
            range,
            store: store.clone(),
        };
        let orders_query = OrderQuery::new(range, store.clone());

        let (receipts, vouchers, products, suppliers, categories, orders) = tokio::join!(
            load(&self.receipts, spending.key(PosApi::PURCHASE_RECEIPTS), || {
                self.api.purchase_receipts(&spending)
            }),
            load(&self.vouchers, spending.key(PosApi::EXPENSE_VOUCHERS), || {
                self.api.expense_vouchers(&spending)
            }),
            load(&self.products, QueryKey::new(PosApi::PRODUCTS), || self.api.products()),
            load(&self.suppliers, QueryKey::new(PosApi::SUPPLIERS), || self.api.suppliers()),
            load(&self.categories, QueryKey::new(PosApi::CATEGORIES), || self.api.categories()),
            load(&self.period_orders, orders_query.key(), || self.api.orders(&orders_query)),
        );
        let (receipts, vouchers, products, suppliers, categories, orders) =
            (receipts?, vouchers?, products?, suppliers?, categories?, orders?);

        let sources = SpendingSources {
            receipts: &receipts,
            products: &products,
            vouchers: &vouchers,
            suppliers: &suppliers,
        };
        let filter = SpendingFilter {
            range,
            store: store.clone(),
            offset: self.offset,
        };
        let report = reconcile_spending(&sources, &filter);
        let collected = collected_revenue(orders.iter());
        let net_profit = report.net_profit(collected);

        info!(
            %range,
            %store,
            spending = %report.total_spending,
            unclassified = report.unclassified_items,
            "Spending report computed"
        );
        Ok(SpendingSummary {
            range,
            report,
            collected_revenue: collected,
            net_profit,
            expense_categories: ExpenseCategoryNames::from_catalog(&categories),
        })
    }

    /// Stores the operator can filter by.
    pub async fn stores(&self) -> ClientResult<Arc<Vec<Store>>> {
        load(&self.stores, QueryKey::new(PosApi::STORES), || self.api.stores()).await
    }

    // =========================================================================
    // Slot Management
    // =========================================================================

    /// Combined status of every slot that has been used.
    pub async fn status(&self) -> ViewStatus {
        ViewStatus::all([
            self.slot_status(&self.period_orders).await,
            self.slot_status(&self.current_orders).await,
            self.slot_status(&self.order_items).await,
            self.slot_status(&self.receipts).await,
            self.slot_status(&self.vouchers).await,
            self.slot_status(&self.products).await,
            self.slot_status(&self.suppliers).await,
            self.slot_status(&self.categories).await,
            self.slot_status(&self.stores).await,
        ])
    }

    async fn slot_status<T>(&self, slot: &QuerySlot<T>) -> ViewStatus {
        if slot.active_key().await.is_none() {
            return ViewStatus::Ready;
        }
        ViewStatus::of(&slot.state().await)
    }

    /// Re-arms every failed slot. Returns how many were failed.
    pub async fn retry(&self) -> usize {
        let results = [
            self.period_orders.retry().await,
            self.current_orders.retry().await,
            self.order_items.retry().await,
            self.receipts.retry().await,
            self.vouchers.retry().await,
            self.products.retry().await,
            self.suppliers.retry().await,
            self.categories.retry().await,
            self.stores.retry().await,
        ];
        let count = results.iter().filter(|&&rearmed| rearmed).count();
        if count > 0 {
            info!(count, "Retrying failed queries");
        }
        count
    }

    /// Forgets every cached snapshot.
    pub async fn refresh(&self) {
        self.period_orders.invalidate().await;
        self.current_orders.invalidate().await;
        self.order_items.invalidate().await;
        self.receipts.invalidate().await;
        self.vouchers.invalidate().await;
        self.products.invalidate().await;
        self.suppliers.invalidate().await;
        self.categories.invalidate().await;
        self.stores.invalidate().await;
    }
}

/// Returns the slot's value for `key`, fetching it first when needed.
async fn load<T, F, Fut>(slot: &QuerySlot<T>, key: QueryKey, fetch: F) -> ClientResult<Arc<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    if !slot.needs_fetch(&key).await {
        return slot.ready(&key).await;
    }
    let ticket = slot.begin(key).await;
    let result = fetch().await;
    slot.resolve(&ticket, result).await
}
