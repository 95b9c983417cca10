//! # Lenient Wire Coercion
//!
//! The POS backend is loose about JSON types: amounts arrive as numbers,
//! decimal strings or `null`, ids as numbers or strings, and flags are
//! sometimes missing entirely. Reports must never fail because of one bad
//! record, so every domain field is read through one of these adapters.
//!
//! ## Coercion Table
//! ```text
//! ┌──────────────────┬───────────────────────────┬────────────────────────┐
//! │ Adapter          │ Accepts                   │ Otherwise              │
//! ├──────────────────┼───────────────────────────┼────────────────────────┤
//! │ money            │ number, decimal string    │ Money::zero()          │
//! │ optional_money   │ number, decimal string    │ None ("" / null too)   │
//! │ optional_int     │ integer, float, "12"      │ None                   │
//! │ id               │ string, number            │ ""                     │
//! │ optional_text    │ string, number, bool      │ None (blank too)       │
//! │ flag             │ true                      │ false                  │
//! │ optional_flag    │ true / false              │ None                   │
//! │ timestamp        │ RFC 3339, naive, date     │ None                   │
//! │ date             │ YYYY-MM-DD or timestamp   │ None                   │
//! │ list             │ array                     │ empty Vec (null too)   │
//! └──────────────────┴───────────────────────────┴────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use serde::Deserialize;
//! use tally_core::coerce;
//! use tally_core::money::Money;
//!
//! #[derive(Deserialize)]
//! struct Line {
//!     #[serde(default, deserialize_with = "coerce::money")]
//!     total: Money,
//! }
//!
//! let line: Line = serde_json::from_str(r#"{"total": "12.50"}"#).unwrap();
//! assert_eq!(line.total, Money::from_cents(1250));
//! let line: Line = serde_json::from_str(r#"{"total": "n/a"}"#).unwrap();
//! assert_eq!(line.total, Money::zero());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

use crate::money::Money;
use crate::types::Timestamp;

// =============================================================================
// Value Conversions
// =============================================================================

/// Reads a monetary amount, or `None` when the value carries no number.
pub fn money_from_value(value: &Value) -> Option<Money> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(whole) => whole.checked_mul(100).map(Money::from_cents),
            None => number.as_f64().and_then(Money::from_major_f64),
        },
        Value::String(text) => {
            let trimmed = text.trim();
            Money::parse_decimal(trimmed).or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Money::from_major_f64)
            })
        }
        _ => None,
    }
}

/// Reads an integer code, truncating fractional values toward zero.
pub fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Reads free text; blank strings count as absent.
///
/// Numbers and booleans are rendered as text, and arrays or objects as their
/// compact JSON so that structured payment data survives as a string.
pub fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Reads an identifier that may be numeric or textual.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

// =============================================================================
// serde Adapters
// =============================================================================

/// `deserialize_with` adapter: amount, zero when absent or malformed.
pub fn money<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(money_from_value(&value).unwrap_or_default())
}

/// `deserialize_with` adapter: amount that may legitimately be unset.
pub fn optional_money<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(money_from_value(&value))
}

/// `deserialize_with` adapter: integer code.
pub fn optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(int_from_value(&value))
}

/// `deserialize_with` adapter: integer count, zero when malformed.
pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_int(deserializer)?.unwrap_or(0))
}

/// `deserialize_with` adapter: identifier, empty when absent.
pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value).unwrap_or_default())
}

/// `deserialize_with` adapter: optional identifier.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value))
}

/// `deserialize_with` adapter: optional text.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_from_value(&value))
}

/// `deserialize_with` adapter: text, empty when absent.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

/// `deserialize_with` adapter: strict flag, only JSON `true` is true.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

/// `deserialize_with` adapter: tri-state flag (`true`, `false`, unknown).
pub fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool())
}

/// `deserialize_with` adapter: timestamp, `None` when unparseable.
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(Timestamp::parse))
}

/// `deserialize_with` adapter: calendar date.
///
/// Accepts `YYYY-MM-DD` or any timestamp, taking the date as written.
pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(parse_date))
}

/// Parses `YYYY-MM-DD`, falling back to the date part of a timestamp.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| Timestamp::parse(trimmed).map(|ts| ts.written_date()))
}

/// `deserialize_with` adapter: list that may be `null`.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `deserialize_with` adapter: any defaultable value that may be `null`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `serialize_with` adapter: amount as a plain decimal string.
pub fn decimal_string<S>(money: &Money, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&money.to_decimal_string())
}

/// `serialize_with` adapter: optional amount, empty string when unset.
pub fn optional_decimal_string<S>(money: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match money {
        Some(amount) => decimal_string(amount, serializer),
        None => serializer.serialize_str(""),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_money_from_value() {
        assert_eq!(money_from_value(&json!(150000)), Some(Money::from_cents(15_000_000)));
        assert_eq!(money_from_value(&json!(12.5)), Some(Money::from_cents(1250)));
        assert_eq!(money_from_value(&json!("150000.00")), Some(Money::from_cents(15_000_000)));
        assert_eq!(money_from_value(&json!("1e3")), Some(Money::from_cents(100_000)));
        assert_eq!(money_from_value(&json!("abc")), None);
        assert_eq!(money_from_value(&json!("")), None);
        assert_eq!(money_from_value(&Value::Null), None);
        assert_eq!(money_from_value(&json!(true)), None);
        assert_eq!(money_from_value(&json!("NaN")), None);
    }

    #[test]
    fn test_int_from_value() {
        assert_eq!(int_from_value(&json!(4)), Some(4));
        assert_eq!(int_from_value(&json!("15")), Some(15));
        assert_eq!(int_from_value(&json!(2.9)), Some(2));
        assert_eq!(int_from_value(&json!("2.5")), Some(2));
        assert_eq!(int_from_value(&json!("x")), None);
        assert_eq!(int_from_value(&Value::Null), None);
    }

    #[test]
    fn test_text_from_value() {
        assert_eq!(text_from_value(&json!("cash")), Some("cash".to_string()));
        assert_eq!(text_from_value(&json!(2)), Some("2".to_string()));
        assert_eq!(text_from_value(&json!("  ")), None);
        assert_eq!(
            text_from_value(&json!([{"method": "cash"}])),
            Some(r#"[{"method":"cash"}]"#.to_string())
        );
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(id_from_value(&json!(17)), Some("17".to_string()));
        assert_eq!(id_from_value(&json!("abc")), Some("abc".to_string()));
        assert_eq!(id_from_value(&json!("")), None);
        assert_eq!(id_from_value(&json!({"id": 1})), None);
    }

    #[derive(Debug, Deserialize)]
    struct WireRow {
        #[serde(default, deserialize_with = "money")]
        amount: Money,
        #[serde(default, deserialize_with = "flag")]
        enabled: bool,
        #[serde(default, deserialize_with = "optional_flag")]
        paid: Option<bool>,
        #[serde(default, deserialize_with = "list")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "date")]
        day: Option<NaiveDate>,
    }

    #[test]
    fn test_adapters_tolerate_nulls_and_missing_fields() {
        let row: WireRow = serde_json::from_value(json!({
            "amount": null,
            "enabled": "true",
            "paid": null,
            "tags": null,
            "day": "garbage"
        }))
        .unwrap();
        assert_eq!(row.amount, Money::zero());
        assert!(!row.enabled);
        assert_eq!(row.paid, None);
        assert!(row.tags.is_empty());
        assert_eq!(row.day, None);

        let row: WireRow = serde_json::from_value(json!({})).unwrap();
        assert_eq!(row.amount, Money::zero());
        assert!(row.tags.is_empty());
    }

    #[test]
    fn test_date_accepts_timestamps() {
        assert_eq!(
            parse_date("2024-03-01T17:00:00.000Z"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("01/03/2024"), None);
    }
}
