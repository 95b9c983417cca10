//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule failures                           │
//! │  └── ValidationError  - Form input failures                            │
//! │                                                                         │
//! │  tally-client errors (separate crate)                                  │
//! │  └── ClientError      - Transport, session and config failures         │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── CliError         - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → CliError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aggregation itself never fails: malformed records coerce to zero or are
//! skipped. Errors here only come from explicit user input (range selectors,
//! custom dates, promotion forms).

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A range selector string that no report understands.
    #[error("Unknown date range selector: {0}")]
    UnknownRangeSelector(String),

    /// A custom range whose end precedes its start.
    ///
    /// ## When This Occurs
    /// Only when a range is built directly from two dates (CLI `--from/--to`).
    /// The interactive [`DateRangePicker`](crate::date_range::DateRangePicker)
    /// snaps the other bound instead of failing.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// A store filter that is neither `all` nor a store code.
    #[error("Invalid store filter: {0:?}")]
    InvalidStoreFilter(String),

    /// Promotion form rejected; every problem is reported at once.
    #[error("Invalid promotion: {}", summarize(.0))]
    InvalidPromotion(Vec<ValidationError>),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value is not a number.
    #[error("{field} must be a number")]
    NotANumber { field: String },

    /// Two dates are in the wrong order.
    #[error("{from_field} must not be after {to_field}")]
    DateOrder { from_field: String, to_field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the offending form field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::NotANumber { field }
            | ValidationError::InvalidFormat { field, .. } => field,
            ValidationError::DateOrder { to_field, .. } => to_field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidDateRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid date range: 2024-03-10 is after 2024-03-01"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "discountValue".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "discountValue must be between 0 and 100");
    }

    #[test]
    fn test_invalid_promotion_lists_every_problem() {
        let err = CoreError::InvalidPromotion(vec![
            ValidationError::Required {
                field: "name".to_string(),
            },
            ValidationError::Required {
                field: "validFrom".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid promotion: name is required; validFrom is required"
        );
    }

    #[test]
    fn test_date_order_points_at_end_field() {
        let err = ValidationError::DateOrder {
            from_field: "validFrom".to_string(),
            to_field: "validTo".to_string(),
        };
        assert_eq!(err.field(), "validTo");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
