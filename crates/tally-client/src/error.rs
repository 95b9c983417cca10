//! # Client Error Types
//!
//! Error types for configuration, session and backend access.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Http { status }        │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Unauthorized           │ │
//! │  │  ConfigLoad/Save│  │  Request        │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Session      │  │     Query       │                              │
//! │  │                 │  │                 │                              │
//! │  │  SessionStore   │  │  QueryFailed    │                              │
//! │  │                 │  │  NotReady       │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_core::CoreError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering all possible data-access failures.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid backend URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Reading or writing the persisted token failed.
    #[error("Session storage error: {0}")]
    SessionStoreFailed(String),

    /// The backend rejected the session (HTTP 401). Stored credentials have
    /// been cleared.
    #[error("Authentication required: the session has expired, please sign in again")]
    Unauthorized,

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the backend.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The request could not be built or sent.
    #[error("Request failed: {0}")]
    Request(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-success HTTP status other than 401.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Query Errors
    // =========================================================================
    /// A query slot holds a failure for this signature; retry it first.
    #[error("Query {key} failed: {message}")]
    QueryFailed {
        key: String,
        status: Option<u16>,
        message: String,
    },

    /// A query slot has no data yet.
    #[error("Query {0} is still loading")]
    NotReady(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Core rule violation (range, store filter, promotion form).
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ClientError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl ClientError {
    /// Returns true if a read can be retried.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx responses and 429 Too Many Requests
    ///
    /// ## Non-Retryable Errors
    /// - Every other 4xx, including 401
    /// - Malformed responses, configuration problems
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) => true,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if the user has to sign in again.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Http { status, .. } => Some(*status),
            ClientError::QueryFailed { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::ConnectionFailed("refused".into()).is_retryable());
        assert!(ClientError::Timeout("30s".into()).is_retryable());
        assert!(ClientError::Http {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(ClientError::Http {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());

        assert!(!ClientError::Http {
            status: 404,
            message: "missing".into()
        }
        .is_retryable());
        assert!(!ClientError::Unauthorized.is_retryable());
        assert!(!ClientError::InvalidResponse("eof".into()).is_retryable());
    }

    #[test]
    fn test_status() {
        assert_eq!(ClientError::Unauthorized.status(), Some(401));
        assert_eq!(
            ClientError::Http {
                status: 500,
                message: String::new()
            }
            .status(),
            Some(500)
        );
        assert_eq!(ClientError::Timeout("x".into()).status(), None);
    }

    #[test]
    fn test_categories() {
        assert!(ClientError::Unauthorized.is_auth_error());
        assert!(ClientError::InvalidUrl("ftp://".into()).is_config_error());
        assert!(!ClientError::Unauthorized.is_config_error());
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: ClientError = CoreError::UnknownRangeSelector("fortnight".into()).into();
        assert_eq!(err.to_string(), "Unknown date range selector: fortnight");
    }
}
