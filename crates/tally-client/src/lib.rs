//! # tally-client: Data Access for Tally POS Reports
//!
//! This crate talks to the POS REST backend and feeds the snapshots it
//! receives into `tally-core`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  ReportService (Orchestrator)                    │  │
//! │  │                                                                  │  │
//! │  │  dashboard / sales / spending                                    │  │
//! │  │  One QuerySlot per dependency, loaded with tokio::join!          │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   QuerySlot    │  │    PosApi      │  │    ClientConfig        │    │
//! │  │                │  │                │  │                        │    │
//! │  │ loading/error/ │  │ Typed routes   │  │ TOML + TALLY_* env     │    │
//! │  │ ready, stale   │  │ Lenient list   │  │ Base URL, retries,     │    │
//! │  │ responses drop │  │ envelopes      │  │ store, UTC offset      │    │
//! │  └────────────────┘  └───────┬────────┘  └────────────────────────┘    │
//! │                              ▼                                          │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │  Transport (reqwest)            Session (token file)           │    │
//! │  │  Bearer auth · retry budget ──► X-New-Token rotates            │    │
//! │  │  with backoff on reads          401 clears                     │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Client configuration (TOML file + environment)
//! - [`error`] - Client error types
//! - [`session`] - Bearer token with persistence and rotation
//! - [`transport`] - HTTP transport with retries
//! - [`query`] - Query slots and view status
//! - [`api`] - Typed POS endpoints
//! - [`service`] - Report orchestration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_client::{ClientConfig, ReportService};
//! use tally_core::date_range::{resolve, RangeSelector};
//!
//! let config = ClientConfig::load_or_default(None);
//! let service = ReportService::from_config(&config).await?;
//!
//! let range = resolve(RangeSelector::ThisWeek, today).unwrap();
//! let report = service.sales(range, &config.store_filter()?).await?;
//! println!("Revenue: {}", report.summary.total_sales_revenue);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod query;
pub mod service;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{OrderQuery, PosApi, SpendingQuery};
pub use config::{ApiSettings, ClientConfig, ReportSettings, SessionSettings};
pub use error::{ClientError, ClientResult};
pub use query::{QueryFailure, QueryKey, QuerySlot, QueryState, ViewStatus};
pub use service::{ReportService, SpendingSummary};
pub use session::Session;
pub use transport::{Transport, TransportConfig};
