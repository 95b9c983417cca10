//! # Promotions
//!
//! Promotion rules as stored by the backend, and the form model used to
//! create or edit them.
//!
//! ## Shape of a Promotion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Promotion                                                              │
//! │  ├── base rule      discountValue + discountValueType, minOrderAmount   │
//! │  ├── cap            maxDiscountAmount (unset or 0 = no cap)             │
//! │  ├── window         validFrom ..= validTo, isActive                     │
//! │  ├── scope          storeCode: "SYSTEM" or "Q1,Q3"                      │
//! │  └── tiers          conditions: JSON text                               │
//! │                     [{"minOrderAmount":"500000","discountValue":"15",   │
//! │                       "discountValueType":"percent"}, ...]              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percent values are held as [`Money`] hundredths, which is the same number
//! as basis points: 12.5% is `Money::from_cents(1250)` and 1250 bps.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    validate_amount_text, validate_date_order, validate_date_text, validate_non_negative,
    validate_optional_amount_text, validate_percent, validate_promotion_code,
    validate_required_text, ValidationResult, MAX_PROMOTION_NAME_LENGTH,
};

/// Store code meaning "every store".
pub const SYSTEM_STORE_CODE: &str = "SYSTEM";

// =============================================================================
// Enums
// =============================================================================

/// What the discount is taken off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[default]
    OrderDiscount,
    ProductDiscount,
}

impl<'de> Deserialize<'de> for DiscountType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str().map(str::trim) {
            Some("product_discount") => DiscountType::ProductDiscount,
            _ => DiscountType::OrderDiscount,
        })
    }
}

/// Whether a discount value is a percentage or a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountValueType {
    #[default]
    Percent,
    Amount,
}

impl<'de> Deserialize<'de> for DiscountValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str().map(str::trim) {
            Some("amount") => DiscountValueType::Amount,
            _ => DiscountValueType::Percent,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionType {
    #[default]
    Order,
    Product,
}

impl<'de> Deserialize<'de> for PromotionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str().map(str::trim) {
            Some("product") => PromotionType::Product,
            _ => PromotionType::Order,
        })
    }
}

// =============================================================================
// Store Scope
// =============================================================================

/// Which stores a promotion applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreScope {
    #[default]
    AllStores,
    Stores(Vec<String>),
}

impl StoreScope {
    /// Reads the backend's `storeCode` column.
    ///
    /// `"SYSTEM"`, blank and missing all mean every store.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::promotion::StoreScope;
    ///
    /// assert_eq!(StoreScope::parse(Some("SYSTEM")), StoreScope::AllStores);
    /// assert_eq!(
    ///     StoreScope::parse(Some("Q1, Q3")),
    ///     StoreScope::Stores(vec!["Q1".to_string(), "Q3".to_string()])
    /// );
    /// ```
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(SYSTEM_STORE_CODE) => StoreScope::AllStores,
            Some(list) => Self::from_selection(list.split(',')),
        }
    }

    /// Builds a scope from the stores ticked on the form. Nothing ticked
    /// means every store.
    pub fn from_selection<I, S>(stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stores: Vec<String> = stores
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if stores.is_empty() {
            StoreScope::AllStores
        } else {
            StoreScope::Stores(stores)
        }
    }

    /// Value written back to the `storeCode` column.
    pub fn to_store_code(&self) -> String {
        match self {
            StoreScope::AllStores => SYSTEM_STORE_CODE.to_string(),
            StoreScope::Stores(stores) => stores.join(","),
        }
    }

    pub fn includes(&self, store_code: &str) -> bool {
        match self {
            StoreScope::AllStores => true,
            StoreScope::Stores(stores) => stores.iter().any(|s| s == store_code.trim()),
        }
    }
}

// =============================================================================
// Tiered Conditions
// =============================================================================

/// One discount tier: once the order reaches `min_order_amount`, this
/// tier's discount replaces the base rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionCondition {
    #[serde(
        default,
        deserialize_with = "coerce::money",
        serialize_with = "coerce::decimal_string"
    )]
    pub min_order_amount: Money,

    #[serde(
        default,
        deserialize_with = "coerce::money",
        serialize_with = "coerce::decimal_string"
    )]
    pub discount_value: Money,

    #[serde(default)]
    pub discount_value_type: DiscountValueType,
}

/// Decodes the `conditions` column. Malformed text yields no tiers.
pub fn parse_conditions(raw: Option<&str>) -> Vec<PromotionCondition> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Encodes tiers for the `conditions` column; no tiers is stored as null.
pub fn encode_conditions(conditions: &[PromotionCondition]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }
    serde_json::to_string(conditions).ok()
}

// =============================================================================
// Promotion
// =============================================================================

fn default_active() -> bool {
    true
}

/// Missing or null counts as active; the backend only ever stores `false`
/// explicitly.
fn active_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(active) => active,
        Value::Number(n) => n.as_i64() != Some(0),
        _ => true,
    })
}

/// A promotion as returned by `GET /api/promotions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(default, deserialize_with = "coerce::id")]
    pub id: String,

    #[serde(default, deserialize_with = "coerce::text")]
    pub code: String,

    #[serde(default, deserialize_with = "coerce::text")]
    pub name: String,

    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub description: Option<String>,

    #[serde(default)]
    pub promotion_type: PromotionType,

    #[serde(default)]
    pub discount_type: DiscountType,

    #[serde(default)]
    pub discount_value_type: DiscountValueType,

    #[serde(default, deserialize_with = "coerce::money")]
    pub discount_value: Money,

    #[serde(default, deserialize_with = "coerce::money")]
    pub min_order_amount: Money,

    #[serde(default, deserialize_with = "coerce::optional_money")]
    pub max_discount_amount: Option<Money>,

    #[serde(default, deserialize_with = "coerce::date")]
    pub valid_from: Option<NaiveDate>,

    #[serde(default, deserialize_with = "coerce::date")]
    pub valid_to: Option<NaiveDate>,

    #[serde(default = "default_active", deserialize_with = "active_flag")]
    pub is_active: bool,

    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub store_code: Option<String>,

    /// Raw JSON text; see [`Promotion::tiers`].
    #[serde(default, deserialize_with = "coerce::optional_text")]
    pub conditions: Option<String>,
}

impl Promotion {
    pub fn store_scope(&self) -> StoreScope {
        StoreScope::parse(self.store_code.as_deref())
    }

    /// Active and inside its validity window on `date`. A missing bound is
    /// treated as open.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.is_active
            && self.valid_from.map_or(true, |from| from <= date)
            && self.valid_to.map_or(true, |to| date <= to)
    }

    pub fn tiers(&self) -> Vec<PromotionCondition> {
        parse_conditions(self.conditions.as_deref())
    }

    /// Discount granted on an order of `amount`.
    ///
    /// ## Rules
    /// 1. The tier with the highest minimum that `amount` reaches wins
    /// 2. Otherwise the base rule, if `amount` reaches `min_order_amount`
    /// 3. Otherwise nothing
    ///
    /// The result is capped by `max_discount_amount` (when positive) and by
    /// `amount` itself, and is never negative.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::promotion::{DiscountValueType, Promotion};
    ///
    /// let promo = Promotion {
    ///     discount_value_type: DiscountValueType::Percent,
    ///     discount_value: Money::from_cents(1000), // 10%
    ///     max_discount_amount: Some(Money::from_major(30_000)),
    ///     is_active: true,
    ///     ..Default::default()
    /// };
    /// assert_eq!(promo.discount_for(Money::from_major(200_000)), Money::from_major(20_000));
    /// assert_eq!(promo.discount_for(Money::from_major(500_000)), Money::from_major(30_000));
    /// ```
    pub fn discount_for(&self, amount: Money) -> Money {
        let tiers = self.tiers();
        let rule = tiers
            .iter()
            .filter(|tier| amount >= tier.min_order_amount)
            .max_by_key(|tier| tier.min_order_amount)
            .map(|tier| (tier.discount_value_type, tier.discount_value))
            .or_else(|| {
                (amount >= self.min_order_amount)
                    .then_some((self.discount_value_type, self.discount_value))
            });

        let Some((kind, value)) = rule else {
            return Money::zero();
        };

        let raw = match kind {
            DiscountValueType::Percent => amount.percentage(value.cents()),
            DiscountValueType::Amount => value,
        };

        let capped = match self.max_discount_amount {
            Some(cap) if cap.is_positive() => raw.min(cap),
            _ => raw,
        };

        capped.min(amount).max(Money::zero())
    }
}

// =============================================================================
// Form Model
// =============================================================================

/// One tier row on the promotion form, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionDraft {
    #[serde(deserialize_with = "coerce::text")]
    pub min_order_amount: String,
    #[serde(deserialize_with = "coerce::text")]
    pub discount_value: String,
    pub discount_value_type: DiscountValueType,
}

impl Default for ConditionDraft {
    fn default() -> Self {
        Self {
            min_order_amount: "0".to_string(),
            discount_value: "0".to_string(),
            discount_value_type: DiscountValueType::Percent,
        }
    }
}

/// The promotion form, exactly as typed.
///
/// ## User Workflow
/// ```text
/// 1. Operator fills the form (or `tally promotions check draft.json`)
/// 2. promotion_errors() highlights every bad field at once
/// 3. to_input() builds the POST/PUT body once the form is clean
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromotionDraft {
    #[serde(deserialize_with = "coerce::text")]
    pub code: String,
    #[serde(deserialize_with = "coerce::text")]
    pub name: String,
    #[serde(deserialize_with = "coerce::text")]
    pub description: String,
    pub promotion_type: PromotionType,
    pub discount_type: DiscountType,
    pub discount_value_type: DiscountValueType,
    #[serde(deserialize_with = "coerce::text")]
    pub discount_value: String,
    #[serde(deserialize_with = "coerce::text")]
    pub min_order_amount: String,
    #[serde(deserialize_with = "coerce::text")]
    pub max_discount_amount: String,
    #[serde(deserialize_with = "coerce::text")]
    pub valid_from: String,
    #[serde(deserialize_with = "coerce::text")]
    pub valid_to: String,
    pub is_active: bool,
    /// Ticked store codes. At least one is required; an all-stores
    /// promotion loads with none ticked.
    #[serde(deserialize_with = "coerce::list")]
    pub stores: Vec<String>,
    #[serde(deserialize_with = "coerce::list")]
    pub conditions: Vec<ConditionDraft>,
}

impl Default for PromotionDraft {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            description: String::new(),
            promotion_type: PromotionType::default(),
            discount_type: DiscountType::default(),
            discount_value_type: DiscountValueType::default(),
            discount_value: "0".to_string(),
            min_order_amount: "0".to_string(),
            max_discount_amount: String::new(),
            valid_from: String::new(),
            valid_to: String::new(),
            is_active: true,
            stores: Vec::new(),
            conditions: Vec::new(),
        }
    }
}

impl From<&Promotion> for PromotionDraft {
    /// Loads an existing promotion into the form for editing.
    fn from(promo: &Promotion) -> Self {
        let stores = match promo.store_scope() {
            StoreScope::AllStores => Vec::new(),
            StoreScope::Stores(stores) => stores,
        };

        Self {
            code: promo.code.clone(),
            name: promo.name.clone(),
            description: promo.description.clone().unwrap_or_default(),
            promotion_type: promo.promotion_type,
            discount_type: promo.discount_type,
            discount_value_type: promo.discount_value_type,
            discount_value: promo.discount_value.to_decimal_string(),
            min_order_amount: promo.min_order_amount.to_decimal_string(),
            max_discount_amount: promo
                .max_discount_amount
                .map(|m| m.to_decimal_string())
                .unwrap_or_default(),
            valid_from: promo.valid_from.map(|d| d.to_string()).unwrap_or_default(),
            valid_to: promo.valid_to.map(|d| d.to_string()).unwrap_or_default(),
            is_active: promo.is_active,
            stores,
            conditions: promo
                .tiers()
                .into_iter()
                .map(|tier| ConditionDraft {
                    min_order_amount: tier.min_order_amount.to_decimal_string(),
                    discount_value: tier.discount_value.to_decimal_string(),
                    discount_value_type: tier.discount_value_type,
                })
                .collect(),
        }
    }
}

/// Body of `POST /api/promotions` and `PUT /api/promotions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionInput {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub promotion_type: PromotionType,
    pub discount_type: DiscountType,
    pub discount_value_type: DiscountValueType,
    #[serde(serialize_with = "coerce::decimal_string")]
    pub discount_value: Money,
    #[serde(serialize_with = "coerce::decimal_string")]
    pub min_order_amount: Money,
    #[serde(serialize_with = "coerce::optional_decimal_string")]
    pub max_discount_amount: Option<Money>,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub is_active: bool,
    pub store_code: String,
    pub conditions: Option<String>,
}

impl PromotionInput {
    /// The promotion this body would create, for previewing discounts
    /// before it is saved.
    pub fn preview(&self) -> Promotion {
        Promotion {
            id: String::new(),
            code: self.code.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            promotion_type: self.promotion_type,
            discount_type: self.discount_type,
            discount_value_type: self.discount_value_type,
            discount_value: self.discount_value,
            min_order_amount: self.min_order_amount,
            max_discount_amount: self.max_discount_amount,
            valid_from: Some(self.valid_from),
            valid_to: Some(self.valid_to),
            is_active: self.is_active,
            store_code: Some(self.store_code.clone()),
            conditions: self.conditions.clone(),
        }
    }
}

/// Keeps the value on success, records the problem otherwise.
fn collect<T>(errors: &mut Vec<ValidationError>, result: ValidationResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

/// Parses a discount value typed with its value type.
fn discount_value(field: &str, raw: &str, kind: DiscountValueType) -> ValidationResult<Money> {
    let value = validate_non_negative(field, validate_amount_text(field, raw)?)?;
    match kind {
        DiscountValueType::Percent => validate_percent(field, value),
        DiscountValueType::Amount => Ok(value),
    }
}

fn required_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    validate_date_text(field, raw)
}

impl PromotionDraft {
    fn parse(&self) -> Result<PromotionInput, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = collect(
            &mut errors,
            validate_required_text("name", &self.name, MAX_PROMOTION_NAME_LENGTH),
        );
        let code = collect(&mut errors, validate_promotion_code(&self.code));

        let valid_from = collect(&mut errors, required_date("validFrom", &self.valid_from));
        let valid_to = collect(&mut errors, required_date("validTo", &self.valid_to));
        if let (Some(from), Some(to)) = (valid_from, valid_to) {
            collect(&mut errors, validate_date_order("validFrom", from, "validTo", to));
        }

        let value = collect(
            &mut errors,
            discount_value("discountValue", &self.discount_value, self.discount_value_type),
        );
        let min_order = collect(
            &mut errors,
            validate_amount_text("minOrderAmount", &self.min_order_amount)
                .and_then(|m| validate_non_negative("minOrderAmount", m)),
        );
        let max_discount = collect(
            &mut errors,
            validate_optional_amount_text("maxDiscountAmount", &self.max_discount_amount).and_then(
                |m| match m {
                    Some(m) => validate_non_negative("maxDiscountAmount", m).map(Some),
                    None => Ok(None),
                },
            ),
        );

        let mut tiers = Vec::with_capacity(self.conditions.len());
        for (i, row) in self.conditions.iter().enumerate() {
            let min_field = format!("conditions[{i}].minOrderAmount");
            let value_field = format!("conditions[{i}].discountValue");
            let min = collect(
                &mut errors,
                validate_amount_text(&min_field, &row.min_order_amount)
                    .and_then(|m| validate_non_negative(&min_field, m)),
            );
            let value = collect(
                &mut errors,
                discount_value(&value_field, &row.discount_value, row.discount_value_type),
            );
            if let (Some(min_order_amount), Some(discount_value)) = (min, value) {
                tiers.push(PromotionCondition {
                    min_order_amount,
                    discount_value,
                    discount_value_type: row.discount_value_type,
                });
            }
        }

        if self.stores.iter().all(|store| store.trim().is_empty()) {
            errors.push(ValidationError::Required {
                field: "stores".to_string(),
            });
        }

        match (name, code, valid_from, valid_to, value, min_order, max_discount) {
            (
                Some(name),
                Some(code),
                Some(valid_from),
                Some(valid_to),
                Some(discount_value),
                Some(min_order_amount),
                Some(max_discount_amount),
            ) if errors.is_empty() => {
                let description = self.description.trim();
                Ok(PromotionInput {
                    code,
                    name,
                    description: (!description.is_empty()).then(|| description.to_string()),
                    promotion_type: self.promotion_type,
                    discount_type: self.discount_type,
                    discount_value_type: self.discount_value_type,
                    discount_value,
                    min_order_amount,
                    max_discount_amount,
                    valid_from,
                    valid_to,
                    is_active: self.is_active,
                    store_code: StoreScope::from_selection(&self.stores).to_store_code(),
                    conditions: encode_conditions(&tiers),
                })
            }
            _ => Err(errors),
        }
    }

    /// Every problem with the form, keyed by field. Empty when the form is
    /// ready to submit.
    pub fn promotion_errors(&self) -> Vec<ValidationError> {
        self.parse().err().unwrap_or_default()
    }

    /// Builds the request body, or reports every problem at once.
    pub fn to_input(&self) -> CoreResult<PromotionInput> {
        self.parse().map_err(CoreError::InvalidPromotion)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
