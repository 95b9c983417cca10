//! # Validation Module
//!
//! Input validation for the few places an operator types data in: the
//! promotion form and custom report dates.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Form / CLI input                                             │
//! │  ├── Raw strings, exactly as typed                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, numeric parsing, ranges, date order              │
//! │  └── Every problem reported, keyed by field                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Uniqueness and persistence rules                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-field validators return the first problem; form-level checks in
//! [`crate::promotion`] collect every problem so the form can highlight all
//! of them at once.

use chrono::NaiveDate;
use serde_json::Value;

use crate::coerce::money_from_value;
use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest promotion code the backend accepts.
pub const MAX_PROMOTION_CODE_LENGTH: usize = 50;

/// Longest promotion name the backend accepts.
pub const MAX_PROMOTION_NAME_LENGTH: usize = 200;

/// 100% expressed in hundredths, the unit percent values are stored in.
pub const MAX_PERCENT: Money = Money::from_cents(100_00);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field, returning it trimmed.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_required_text;
///
/// assert_eq!(validate_required_text("name", "  Happy hour ", 200).unwrap(), "Happy hour");
/// assert!(validate_required_text("name", "   ", 200).is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional promotion code.
///
/// ## Rules
/// - May be empty (the backend assigns one)
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_promotion_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.chars().count() > MAX_PROMOTION_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_PROMOTION_CODE_LENGTH,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses an amount typed as text. Blank counts as zero.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::validation::validate_amount_text;
///
/// assert_eq!(validate_amount_text("discountValue", "12.5").unwrap(), Money::from_cents(1250));
/// assert_eq!(validate_amount_text("discountValue", "").unwrap(), Money::zero());
/// assert!(validate_amount_text("discountValue", "ten").is_err());
/// ```
pub fn validate_amount_text(field: &str, raw: &str) -> ValidationResult<Money> {
    if raw.trim().is_empty() {
        return Ok(Money::zero());
    }
    money_from_value(&Value::String(raw.to_string())).ok_or_else(|| ValidationError::NotANumber {
        field: field.to_string(),
    })
}

/// Parses an optional amount typed as text. Blank means "not set".
pub fn validate_optional_amount_text(field: &str, raw: &str) -> ValidationResult<Option<Money>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    validate_amount_text(field, raw).map(Some)
}

/// Validates that an amount is not negative.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<Money> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

/// Validates a percentage held in hundredths (10% = `Money::from_cents(1000)`).
///
/// ## Rules
/// - 0 ≤ value ≤ 100
pub fn validate_percent(field: &str, value: Money) -> ValidationResult<Money> {
    if value.is_negative() || value > MAX_PERCENT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(value)
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates that a date was supplied.
pub fn validate_required_date(field: &str, date: Option<NaiveDate>) -> ValidationResult<NaiveDate> {
    date.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

/// Validates that `from` is not after `to`.
pub fn validate_date_order(
    from_field: &str,
    from: NaiveDate,
    to_field: &str,
    to: NaiveDate,
) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::DateOrder {
            from_field: from_field.to_string(),
            to_field: to_field.to_string(),
        });
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` date typed by the operator.
pub fn validate_date_text(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), crate::date_range::DATE_FORMAT).map_err(|e| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD ({e})"),
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
