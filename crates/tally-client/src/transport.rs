//! # HTTP Transport
//!
//! Authenticated JSON requests against the POS backend.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Lifecycle                              │
//! │                                                                         │
//! │  get(path, query)                                                       │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ┌────────────┐   retryable    ┌────────────┐                           │
//! │  │ send_once  │───────────────►│  Backoff   │── budget left ──┐         │
//! │  │ Bearer ... │   (5xx, 429,   │ 1s, 2s, 4s │                 │         │
//! │  └─────┬──────┘   connect,     └─────┬──────┘                 │         │
//! │        │          timeout)           │ budget spent           │         │
//! │        │                             ▼                        │         │
//! │        │                        terminal error ◄──────────────┘         │
//! │        ▼                                                                │
//! │  handle_response                                                        │
//! │     ├── X-New-Token ──► session.rotate                                  │
//! │     ├── 401         ──► session.clear ──► Unauthorized                  │
//! │     ├── !2xx        ──► Http { status, message }                        │
//! │     └── 2xx         ──► JSON body (empty body reads as null)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Only reads are retried, within a fixed budget.
//! - Mutations (POST, PUT, DELETE) are sent exactly once.
//! - 4xx responses are never retried.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Response header carrying a replacement session token.
pub const NEW_TOKEN_HEADER: &str = "x-new-token";

/// Header tagging each request for log correlation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Transport Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Backend root; always ends with `/`.
    pub base_url: Url,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Retries after the first attempt (reads only).
    pub max_retries: u32,

    /// Initial backoff duration.
    pub initial_backoff: Duration,

    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl TransportConfig {
    pub fn new(base_url: Url) -> Self {
        TransportConfig {
            base_url: with_trailing_slash(base_url),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
        }
    }

    pub fn from_client_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(TransportConfig {
            base_url: with_trailing_slash(config.base_url()?),
            timeout: Duration::from_secs(config.api.timeout_secs),
            max_retries: config.api.max_retries,
            initial_backoff: Duration::from_millis(config.api.initial_backoff_ms),
            max_backoff: Duration::from_secs(config.api.max_backoff_secs),
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

// =============================================================================
// Transport
// =============================================================================

/// JSON-over-HTTP client bound to one backend and one session.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    config: TransportConfig,
    session: Arc<Session>,
}

impl Transport {
    pub fn new(config: TransportConfig, session: Arc<Session>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;

        Ok(Transport {
            client,
            config,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    /// GET with the retry budget applied.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let mut backoff = self.create_backoff();
        backoff.reset();
        let mut retries = 0u32;

        loop {
            match self.send_once(Method::GET, path, query, None).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or(self.config.max_backoff);
                    warn!(
                        path,
                        attempt = retries,
                        max_retries = self.config.max_retries,
                        ?delay,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(path, attempts = retries + 1, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        self.send_mutation(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        self.send_mutation(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_mutation(Method::DELETE, path, None).await
    }

    async fn send_mutation<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<T> {
        let result = self.send_once(method.clone(), path, &[], body.as_ref()).await;
        if let Err(e) = &result {
            error!(%method, path, error = %e, "Mutation failed");
        }
        result
    }

    // =========================================================================
    // Single Attempt
    // =========================================================================

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ClientResult<T> {
        let url = self.config.base_url.join(path.trim_start_matches('/'))?;
        let request_id = Uuid::new_v4();

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, %request_id, "Sending request");
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ClientResult<T> {
        let status = response.status();

        let new_token = response
            .headers()
            .get(NEW_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if let Some(token) = new_token {
            if let Err(e) = self.session.rotate(&token).await {
                warn!(error = %e, "Failed to persist rotated token");
            }
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected the session");
            if let Err(e) = self.session.clear().await {
                warn!(error = %e, "Failed to remove stored token");
            }
            return Err(ClientError::Unauthorized);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        let body = body.trim();
        let body = if body.is_empty() { "null" } else { body };
        Ok(serde_json::from_str(body)?)
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_interval: self.config.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Prefers the backend's `message`/`error` field over the raw body.
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_backend, transport_for};
    use tempfile::TempDir;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_trailing_slash() {
        let config = TransportConfig::new(Url::parse("http://pos.local/backend").unwrap());
        assert_eq!(config.base_url.as_str(), "http://pos.local/backend/");
        assert_eq!(
            config.base_url.join("api/products").unwrap().as_str(),
            "http://pos.local/backend/api/products"
        );
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"message":"store closed"}"#, StatusCode::CONFLICT),
            "store closed"
        );
        assert_eq!(error_message("", StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(error_message("boom", StatusCode::BAD_GATEWAY), "boom");
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let app = Router::new().route(
            "/api/products",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let has_id = headers.contains_key(REQUEST_ID_HEADER);
                Json(json!({ "auth": auth, "hasId": has_id }))
            }),
        );
        let base = spawn_backend(app).await;
        let transport = transport_for(&base, Session::with_token("abc"), 0);

        let body: Value = transport.get("/api/products", &[]).await.unwrap();
        assert_eq!(body["auth"], "Bearer abc");
        assert_eq!(body["hasId"], true);
    }

    #[tokio::test]
    async fn test_rotates_and_persists_token() {
        let app = Router::new().route(
            "/api/orders/list",
            get(|| async { ([(NEW_TOKEN_HEADER, "fresh")], Json(json!({ "orders": [] }))) }),
        );
        let base = spawn_backend(app).await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.token");
        let session = Session::load(&path).unwrap();
        session.set_token("stale").await.unwrap();
        let transport = transport_for(&base, session, 0);

        let _: Value = transport.get("api/orders/list", &[]).await.unwrap();
        assert_eq!(transport.session().token().await.as_deref(), Some("fresh"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/suppliers",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::UNAUTHORIZED
                }
            }),
        );
        let base = spawn_backend(app).await;
        let transport = transport_for(&base, Session::with_token("abc"), 3);

        let err = transport.get::<Value>("api/suppliers", &[]).await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(!transport.session().is_authenticated().await);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_is_fixed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/categories",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::SERVICE_UNAVAILABLE
                }
            }),
        );
        let base = spawn_backend(app).await;
        let transport = transport_for(&base, Session::new(), 2);

        let err = transport.get::<Value>("api/categories", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_recovers_within_budget() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/categories",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(AxumStatus::BAD_GATEWAY)
                    } else {
                        Ok(Json(json!([{ "id": 1 }])))
                    }
                }
            }),
        );
        let base = spawn_backend(app).await;
        let transport = transport_for(&base, Session::new(), 3);

        let body: Value = transport.get("api/categories", &[]).await.unwrap();
        assert_eq!(body[0]["id"], 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/promotions",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (AxumStatus::NOT_FOUND, Json(json!({ "message": "no such route" })))
                }
            }),
        );
        let base = spawn_backend(app).await;
        let transport = transport_for(&base, Session::new(), 3);

        let err = transport.get::<Value>("api/promotions", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("no such route"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mutations_are_sent_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/promotions",
            post(move |Json(body): Json<Value>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let _ = body;
                    AxumStatus::INTERNAL_SERVER_ERROR
                }
            }),
        );
        let base = spawn_backend(app).await;
        let transport = transport_for(&base, Session::new(), 3);

        let err = transport
            .post::<_, Value>("api/promotions", &json!({ "name": "Happy hour" }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_body_reads_as_null() {
        let app = Router::new().route("/api/promotions/7", axum::routing::delete(|| async { AxumStatus::NO_CONTENT }));
        let base = spawn_backend(app).await;
        let transport = transport_for(&base, Session::new(), 0);

        let body: Option<Value> = transport.delete("api/promotions/7").await.unwrap();
        assert!(body.is_none());
    }
}
