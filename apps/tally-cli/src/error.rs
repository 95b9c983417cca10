//! # CLI Error Type
//!
//! Unified error type for every command.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Error Flow in tally                              │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<T, CliError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Client Error? ──── ClientError::Unauthorized ──────┐                   │
//! │         │                                           │                   │
//! │         ▼                                           ▼                   │
//! │  Core Error? ────── CoreError::InvalidPromotion ── CliError ──► stderr  │
//! │         │                                       { code, message }       │
//! │         ▼                                       exit status 1           │
//! │  Success ──────────────────────────────────────────────────────► stdout │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `--format json` the error is printed as:
//! ```json
//! {
//!   "code": "UNAUTHORIZED",
//!   "message": "Authentication required: the session has expired, please sign in again"
//! }
//! ```

use serde::Serialize;
use tally_client::ClientError;
use tally_core::CoreError;

/// Error returned from CLI commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad flag or input file content
    ValidationError,

    /// Config file or environment problem
    ConfigError,

    /// The session is missing or expired
    Unauthorized,

    /// Backend unreachable or timed out
    Unavailable,

    /// Backend answered with an error status
    BackendError,

    /// Anything else
    Internal,
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        let code = match &err {
            ClientError::Core(_) => ErrorCode::ValidationError,
            e if e.is_config_error() => ErrorCode::ConfigError,
            e if e.is_auth_error() => ErrorCode::Unauthorized,
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) => ErrorCode::Unavailable,
            ClientError::Http { .. } | ClientError::QueryFailed { .. } | ClientError::InvalidResponse(_) => {
                ErrorCode::BackendError
            }
            _ => ErrorCode::Internal,
        };
        if code == ErrorCode::Internal {
            tracing::error!(error = %err, "Unexpected client failure");
        }
        CliError::new(code, err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::validation(format!("Invalid JSON: {}", err))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}
