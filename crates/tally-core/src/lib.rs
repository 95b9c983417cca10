//! # tally-core: Pure Reporting Logic for Tally POS
//!
//! This crate turns raw snapshots from the POS backend (orders, order items,
//! purchase receipts, expense vouchers, catalog) into the figures shown on
//! the dashboard, the sales report and the spending report. Everything here
//! is a pure function with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Reporting                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-cli                                    │   │
//! │  │    dashboard ──► sales ──► spending ──► promotions ──► settings │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-client                                 │   │
//! │  │    Session · Transport (retry, token rotation) · Query slots    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ snapshots                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │date_range │  │  revenue  │  │ grouping  │  │ spending  │  │   │
//! │  │   │ resolver  │  │ summarize │  │ day/hour/ │  │ classify  │  │   │
//! │  │   │  picker   │  │           │  │ pay/top-N │  │ debts     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire records (Order, PurchaseReceipt, ExpenseVoucher, ...)
//! - [`coerce`] - Lenient JSON adapters (numbers, decimal strings, nulls)
//! - [`money`] - Money as integer hundredths
//! - [`date_range`] - Symbolic range selectors and the shared range picker
//! - [`revenue`] - Headline revenue reconciliation
//! - [`grouping`] - Day, hour, payment method, product and customer breakdowns
//! - [`spending`] - Spending classification and supplier debt
//! - [`reports`] - Dashboard and sales report composition
//! - [`promotion`] - Promotion rules and the promotion form
//! - [`validation`] - Form input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: "today" and the UTC offset are always arguments
//! 2. **Never Fail on Data**: a malformed record coerces to zero or is skipped
//! 3. **Integer Money**: sums are exact, so results do not depend on order
//! 4. **One Formula**: [`Order::net_revenue`] is the only revenue definition
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tally_core::date_range::{resolve, RangeSelector};
//!
//! // Sunday 2024-03-10: the week still starts on Monday the 4th
//! let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
//! let week = resolve(RangeSelector::ThisWeek, today).unwrap();
//! assert_eq!(week.start_param(), "2024-03-04");
//! assert_eq!(week.end_param(), "2024-03-10");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coerce;
pub mod date_range;
pub mod error;
pub mod grouping;
pub mod money;
pub mod promotion;
pub mod reports;
pub mod revenue;
pub mod spending;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use date_range::{DateRange, DateRangePicker, RangeSelector};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use promotion::{Promotion, PromotionDraft, PromotionInput};
pub use reports::{DashboardStats, SalesReport};
pub use revenue::RevenueSummary;
pub use spending::SpendingReport;
pub use types::*;
