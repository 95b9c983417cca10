//! # Query Slots
//!
//! Memoized fetch state for one data dependency of a view.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Query Slot States                               │
//! │                                                                         │
//! │            begin(key)               resolve(Ok)                         │
//! │   ┌──────┐ ─────────► ┌─────────┐ ─────────────► ┌───────────┐          │
//! │   │ Idle │            │ Loading │                │ Ready(T)  │          │
//! │   └──────┘ ◄───┐      └────┬────┘                └─────┬─────┘          │
//! │                │           │ resolve(Err)              │ begin(new key) │
//! │          retry │           ▼                           ▼                │
//! │                │      ┌────────────┐              ┌─────────┐           │
//! │                └──────│ Failed(e)  │              │ Loading │           │
//! │                       └────────────┘              └─────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Every `begin` hands out a [`QueryTicket`]. Only the ticket of the most
//!   recent `begin` may resolve the slot; older responses are discarded no
//!   matter when they arrive.
//! - A failure is terminal for its key until [`QuerySlot::retry`].
//! - A ready value is reused while the key is unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Query Key
// =============================================================================

/// Request signature: endpoint plus filter parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryKey {
    pub endpoint: String,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(endpoint: impl Into<String>) -> Self {
        QueryKey {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a filter parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, name, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// Query State
// =============================================================================

/// What a failed query remembers about its error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl From<&ClientError> for QueryFailure {
    fn from(err: &ClientError) -> Self {
        QueryFailure {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug)]
pub enum QueryState<T> {
    Idle,
    Loading,
    Ready(Arc<T>),
    Failed(QueryFailure),
}

// Derived Clone would demand T: Clone.
impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Loading => QueryState::Loading,
            QueryState::Ready(value) => QueryState::Ready(Arc::clone(value)),
            QueryState::Failed(failure) => QueryState::Failed(failure.clone()),
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn value(&self) -> Option<&Arc<T>> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&QueryFailure> {
        match self {
            QueryState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

// =============================================================================
// Query Slot
// =============================================================================

/// Proof that a fetch was started; needed to resolve the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    key: QueryKey,
    generation: u64,
}

impl QueryTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug)]
struct SlotInner<T> {
    key: Option<QueryKey>,
    generation: u64,
    state: QueryState<T>,
}

/// One memoized dependency.
#[derive(Debug)]
pub struct QuerySlot<T> {
    name: &'static str,
    inner: RwLock<SlotInner<T>>,
}

impl<T> QuerySlot<T> {
    pub fn new(name: &'static str) -> Self {
        QuerySlot {
            name,
            inner: RwLock::new(SlotInner {
                key: None,
                generation: 0,
                state: QueryState::Idle,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `key` has to be fetched.
    ///
    /// False when the slot already holds data, an in-flight fetch, or a
    /// terminal failure for the same key.
    pub async fn needs_fetch(&self, key: &QueryKey) -> bool {
        let inner = self.inner.read().await;
        inner.key.as_ref() != Some(key) || matches!(inner.state, QueryState::Idle)
    }

    /// Marks a fetch for `key` as in flight and supersedes every earlier one.
    pub async fn begin(&self, key: QueryKey) -> QueryTicket {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.key = Some(key.clone());
        inner.state = QueryState::Loading;
        debug!(slot = self.name, key = %key, generation = inner.generation, "Query started");
        QueryTicket {
            key,
            generation: inner.generation,
        }
    }

    /// Applies a fetch outcome if `ticket` is still the latest one.
    ///
    /// A superseded outcome leaves the slot untouched; the caller still gets
    /// its own result back.
    pub async fn resolve(&self, ticket: &QueryTicket, result: ClientResult<T>) -> ClientResult<Arc<T>> {
        let mut inner = self.inner.write().await;
        let current = inner.generation == ticket.generation && inner.key.as_ref() == Some(&ticket.key);

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                if current {
                    inner.state = QueryState::Ready(Arc::clone(&value));
                } else {
                    warn!(slot = self.name, key = %ticket.key, "Discarding stale response");
                }
                Ok(value)
            }
            Err(e) => {
                if current {
                    inner.state = QueryState::Failed(QueryFailure::from(&e));
                } else {
                    warn!(slot = self.name, key = %ticket.key, error = %e, "Discarding stale failure");
                }
                Err(e)
            }
        }
    }

    /// Moves a failed query back to idle so the next fetch runs it again.
    pub async fn retry(&self) -> bool {
        let mut inner = self.inner.write().await;
        if matches!(inner.state, QueryState::Failed(_)) {
            inner.state = QueryState::Idle;
            true
        } else {
            false
        }
    }

    /// Drops whatever the slot holds.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.key = None;
        inner.state = QueryState::Idle;
    }

    pub async fn state(&self) -> QueryState<T> {
        self.inner.read().await.state.clone()
    }

    pub async fn active_key(&self) -> Option<QueryKey> {
        self.inner.read().await.key.clone()
    }

    /// Ready value for `key`, or the error describing why there is none.
    pub async fn ready(&self, key: &QueryKey) -> ClientResult<Arc<T>> {
        let inner = self.inner.read().await;
        if inner.key.as_ref() != Some(key) {
            return Err(ClientError::NotReady(key.to_string()));
        }
        match &inner.state {
            QueryState::Ready(value) => Ok(Arc::clone(value)),
            QueryState::Failed(failure) => Err(ClientError::QueryFailed {
                key: key.to_string(),
                status: failure.status,
                message: failure.message.clone(),
            }),
            QueryState::Idle | QueryState::Loading => Err(ClientError::NotReady(key.to_string())),
        }
    }
}

// =============================================================================
// View Status
// =============================================================================

/// Combined status of every slot a view reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ViewStatus {
    Loading,
    Error(QueryFailure),
    Ready,
}

impl ViewStatus {
    pub fn of<T>(state: &QueryState<T>) -> Self {
        match state {
            QueryState::Ready(_) => ViewStatus::Ready,
            QueryState::Failed(failure) => ViewStatus::Error(failure.clone()),
            QueryState::Idle | QueryState::Loading => ViewStatus::Loading,
        }
    }

    /// First error wins, then loading; ready only if both are.
    pub fn combine(self, other: ViewStatus) -> ViewStatus {
        match (self, other) {
            (ViewStatus::Error(e), _) | (_, ViewStatus::Error(e)) => ViewStatus::Error(e),
            (ViewStatus::Loading, _) | (_, ViewStatus::Loading) => ViewStatus::Loading,
            (ViewStatus::Ready, ViewStatus::Ready) => ViewStatus::Ready,
        }
    }

    pub fn all(statuses: impl IntoIterator<Item = ViewStatus>) -> ViewStatus {
        statuses.into_iter().fold(ViewStatus::Ready, ViewStatus::combine)
    }
}
