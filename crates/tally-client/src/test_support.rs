//! Shared fixtures for the client tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use url::Url;

use crate::session::Session;
use crate::transport::{Transport, TransportConfig};

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Transport with millisecond backoff so retry tests stay fast.
pub fn transport_for(base: &str, session: Session, max_retries: u32) -> Transport {
    let mut config = TransportConfig::new(Url::parse(base).unwrap());
    config.max_retries = max_retries;
    config.initial_backoff = Duration::from_millis(1);
    config.max_backoff = Duration::from_millis(5);
    config.timeout = Duration::from_secs(5);
    Transport::new(config, Arc::new(session)).unwrap()
}
