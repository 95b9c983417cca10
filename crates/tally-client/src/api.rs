//! # POS REST Endpoints
//!
//! Typed wrappers over the backend routes the reports consume.
//!
//! ## Endpoint Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Route                                        │ Shape                   │
//! ├───────────────────────────────────────────────┼─────────────────────────┤
//! │  GET  /api/orders/list?startDate&endDate&     │ { orders, pagination }  │
//! │       status&storeFilter                      │                         │
//! │  GET  /api/order-items/{start}/{end}          │ [OrderItem]             │
//! │  GET  /api/store-settings/list                │ [Store]                 │
//! │  GET  /api/purchase-receipts?...[&storeCode]  │ { data: [Receipt] }     │
//! │  GET  /api/expense-vouchers?...[&storeCode]   │ [ExpenseVoucher]        │
//! │  GET  /api/products | categories | suppliers  │ [..]                    │
//! │  GET  /api/promotions        POST             │ [Promotion]             │
//! │  PUT  /api/promotions/{id}   DELETE           │                         │
//! │  GET  /api/general-settings                   │ [GeneralSetting]        │
//! │  PUT  /api/general-settings/{id} {isActive}   │                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! List routes are read leniently: a bare array, `{ data: [...] }` and
//! `{ orders: [...] }` all decode to the same `Vec`.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::json;
use tally_core::{
    Category, DateRange, ExpenseVoucher, GeneralSetting, Order, OrderItem, OrderStatus, Product,
    Promotion, PromotionInput, PurchaseReceipt, Store, StoreFilter, Supplier,
};
use tracing::{debug, info};

use crate::error::ClientResult;
use crate::query::QueryKey;
use crate::transport::Transport;

/// Status filter value meaning every order status.
pub const ALL_STATUSES: &str = "all";

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "orders")]
        data: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) | ListResponse::Wrapped { data: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SingleResponse<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> SingleResponse<T> {
    fn into_inner(self) -> T {
        match self {
            SingleResponse::Wrapped { data } | SingleResponse::Bare(data) => data,
        }
    }
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Filters for `GET /api/orders/list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub range: DateRange,
    /// `None` asks for every status.
    pub status: Option<OrderStatus>,
    pub store: StoreFilter,
}

impl OrderQuery {
    pub fn new(range: DateRange, store: StoreFilter) -> Self {
        OrderQuery {
            range,
            status: None,
            store,
        }
    }

    fn status_param(&self) -> &str {
        self.status.as_ref().map_or(ALL_STATUSES, OrderStatus::as_str)
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("startDate", self.range.start_param()),
            ("endDate", self.range.end_param()),
            ("status", self.status_param().to_string()),
            ("storeFilter", self.store.as_param().to_string()),
        ]
    }

    pub fn key(&self) -> QueryKey {
        self.params()
            .into_iter()
            .fold(QueryKey::new(PosApi::ORDERS), |key, (name, value)| key.param(name, value))
    }
}

/// Filters shared by purchase receipts and expense vouchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingQuery {
    pub range: DateRange,
    pub store: StoreFilter,
}

impl SpendingQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("startDate", self.range.start_param()),
            ("endDate", self.range.end_param()),
        ];
        if let Some(code) = self.store.store_code() {
            params.push(("storeCode", code.to_string()));
        }
        params
    }

    pub fn key(&self, endpoint: &str) -> QueryKey {
        self.params()
            .into_iter()
            .fold(QueryKey::new(endpoint), |key, (name, value)| key.param(name, value))
    }
}

// =============================================================================
// PosApi
// =============================================================================

/// The POS backend as the reports see it.
#[derive(Debug, Clone)]
pub struct PosApi {
    transport: Transport,
}

impl PosApi {
    pub const ORDERS: &'static str = "api/orders/list";
    pub const ORDER_ITEMS: &'static str = "api/order-items";
    pub const STORES: &'static str = "api/store-settings/list";
    pub const PURCHASE_RECEIPTS: &'static str = "api/purchase-receipts";
    pub const EXPENSE_VOUCHERS: &'static str = "api/expense-vouchers";
    pub const PRODUCTS: &'static str = "api/products";
    pub const CATEGORIES: &'static str = "api/categories";
    pub const SUPPLIERS: &'static str = "api/suppliers";
    pub const PROMOTIONS: &'static str = "api/promotions";
    pub const GENERAL_SETTINGS: &'static str = "api/general-settings";

    pub fn new(transport: Transport) -> Self {
        PosApi { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ClientResult<Vec<T>> {
        let items = self
            .transport
            .get::<ListResponse<T>>(path, query)
            .await?
            .into_vec();
        debug!(path, count = items.len(), "List loaded");
        Ok(items)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    pub async fn orders(&self, query: &OrderQuery) -> ClientResult<Vec<Order>> {
        self.list(Self::ORDERS, &query.params()).await
    }

    pub async fn order_items(&self, range: &DateRange) -> ClientResult<Vec<OrderItem>> {
        let path = format!(
            "{}/{}/{}",
            Self::ORDER_ITEMS,
            range.start_param(),
            range.end_param()
        );
        self.list(&path, &[]).await
    }

    pub fn order_items_key(range: &DateRange) -> QueryKey {
        QueryKey::new(Self::ORDER_ITEMS)
            .param("start", range.start_param())
            .param("end", range.end_param())
    }

    pub async fn stores(&self) -> ClientResult<Vec<Store>> {
        self.list(Self::STORES, &[]).await
    }

    // =========================================================================
    // Spending
    // =========================================================================

    pub async fn purchase_receipts(&self, query: &SpendingQuery) -> ClientResult<Vec<PurchaseReceipt>> {
        self.list(Self::PURCHASE_RECEIPTS, &query.params()).await
    }

    pub async fn expense_vouchers(&self, query: &SpendingQuery) -> ClientResult<Vec<ExpenseVoucher>> {
        self.list(Self::EXPENSE_VOUCHERS, &query.params()).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn products(&self) -> ClientResult<Vec<Product>> {
        self.list(Self::PRODUCTS, &[]).await
    }

    pub async fn categories(&self) -> ClientResult<Vec<Category>> {
        self.list(Self::CATEGORIES, &[]).await
    }

    pub async fn suppliers(&self) -> ClientResult<Vec<Supplier>> {
        self.list(Self::SUPPLIERS, &[]).await
    }

    // =========================================================================
    // Promotions
    // =========================================================================

    pub async fn promotions(&self) -> ClientResult<Vec<Promotion>> {
        self.list(Self::PROMOTIONS, &[]).await
    }

    /// Creates a promotion. Returns the stored record when the backend echoes it.
    pub async fn create_promotion(&self, input: &PromotionInput) -> ClientResult<Option<Promotion>> {
        let created: Option<SingleResponse<Promotion>> = self.transport.post(Self::PROMOTIONS, input).await?;
        info!(code = %input.code, "Promotion created");
        Ok(created.map(SingleResponse::into_inner))
    }

    pub async fn update_promotion(&self, id: &str, input: &PromotionInput) -> ClientResult<Option<Promotion>> {
        let path = format!("{}/{}", Self::PROMOTIONS, id);
        let updated: Option<SingleResponse<Promotion>> = self.transport.put(&path, input).await?;
        info!(id, "Promotion updated");
        Ok(updated.map(SingleResponse::into_inner))
    }

    pub async fn delete_promotion(&self, id: &str) -> ClientResult<()> {
        let path = format!("{}/{}", Self::PROMOTIONS, id);
        let _: IgnoredAny = self.transport.delete(&path).await?;
        info!(id, "Promotion deleted");
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub async fn general_settings(&self) -> ClientResult<Vec<GeneralSetting>> {
        self.list(Self::GENERAL_SETTINGS, &[]).await
    }

    /// Switches one general setting on or off.
    pub async fn set_setting_active(&self, id: &str, active: bool) -> ClientResult<()> {
        let path = format!("{}/{}", Self::GENERAL_SETTINGS, id);
        let _: IgnoredAny = self
            .transport
            .put(&path, &json!({ "isActive": active }))
            .await?;
        info!(id, active, "General setting updated");
        Ok(())
    }
}
