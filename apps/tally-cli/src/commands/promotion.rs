//! # Promotion Commands
//!
//! ## User Workflow
//! 1. `tally promotions list` to see what is running
//! 2. Save the form as JSON (same fields as the web console's form)
//! 3. `tally promotions check form.json --amount 350000` to validate it and
//!    preview the discount before creating it
//! 4. `tally promotions create form.json` (or `update <ID> form.json`)
//!
//! A form that fails validation is never sent to the backend.

use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tally_core::validation::validate_amount_text;
use tally_core::{Money, PromotionDraft, PromotionInput};
use tracing::{debug, info};

use super::Context;
use crate::cli::{Format, PromotionCommand};
use crate::error::{CliError, CliResult};
use crate::output::{promotions_text, render};

/// Outcome of a successful form check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionCheck {
    /// The request body the form produces.
    pub input: PromotionInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
}

pub async fn run(ctx: &Context, command: &PromotionCommand) -> CliResult<String> {
    match command {
        PromotionCommand::List { valid_on } => list(ctx, *valid_on).await,
        PromotionCommand::Check { file, amount } => {
            let check = check_file(file, amount.as_deref())?;
            render(ctx.format, &check, check_text)
        }
        PromotionCommand::Create { file } => {
            let check = check_file(file, None)?;
            let created = ctx.service.api().create_promotion(&check.input).await?;
            let id = created.map(|promo| promo.id);
            info!(code = %check.input.code, id = ?id, "Promotion created");
            Ok(saved_text(ctx.format, "created", id.as_deref(), &check.input))
        }
        PromotionCommand::Update { id, file } => {
            let check = check_file(file, None)?;
            ctx.service.api().update_promotion(id, &check.input).await?;
            info!(id = %id, code = %check.input.code, "Promotion updated");
            Ok(saved_text(ctx.format, "updated", Some(id), &check.input))
        }
        PromotionCommand::Delete { id } => {
            ctx.service.api().delete_promotion(id).await?;
            info!(id = %id, "Promotion deleted");
            Ok(match ctx.format {
                Format::Json => json!({ "id": id, "deleted": true }).to_string(),
                Format::Text => format!("Promotion {} deleted\n", id),
            })
        }
    }
}

/// Confirmation for a saved promotion. The backend may not echo the id back.
fn saved_text(format: Format, action: &str, id: Option<&str>, input: &PromotionInput) -> String {
    match format {
        Format::Json => json!({ "action": action, "id": id, "promotion": input }).to_string(),
        Format::Text => match id {
            Some(id) => format!("Promotion '{}' {} (id {})\n", input.name, action, id),
            None => format!("Promotion '{}' {}\n", input.name, action),
        },
    }
}

async fn list(ctx: &Context, valid_on: Option<chrono::NaiveDate>) -> CliResult<String> {
    let mut promotions = ctx.service.api().promotions().await?;
    if let Some(day) = valid_on {
        promotions.retain(|promo| promo.is_valid_on(day));
    }
    debug!(count = promotions.len(), "promotions listed");
    render(ctx.format, &promotions, |p| promotions_text(p))
}

fn check_file(path: &Path, amount: Option<&str>) -> CliResult<PromotionCheck> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CliError::validation(format!("{}: {}", path.display(), e)))?;
    check_promotion(&contents, amount)
}

/// Validates a promotion form and optionally previews its discount.
///
/// Every invalid field is reported in one error.
pub fn check_promotion(form_json: &str, amount: Option<&str>) -> CliResult<PromotionCheck> {
    let draft: PromotionDraft = serde_json::from_str(form_json)?;
    let input = draft.to_input()?;

    let amount = amount
        .map(|raw| validate_amount_text("amount", raw))
        .transpose()
        .map_err(|e| CliError::validation(e.to_string()))?;
    let discount = amount.map(|amount| input.preview().discount_for(amount));

    Ok(PromotionCheck {
        input,
        amount,
        discount,
    })
}

fn check_text(check: &PromotionCheck) -> String {
    let mut out = format!(
        "Promotion '{}' is valid ({} .. {}, stores: {})\n",
        check.input.name, check.input.valid_from, check.input.valid_to, check.input.store_code
    );
    if let (Some(amount), Some(discount)) = (check.amount, check.discount) {
        out.push_str(&format!(
            "Order of {} gets {} off, pays {}\n",
            amount,
            discount,
            amount - discount
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const FORM: &str = r#"{
        "name": "Weekday lunch",
        "code": "LUNCH-10",
        "discountValueType": "percent",
        "discountValue": "10",
        "maxDiscountAmount": "30000",
        "validFrom": "2024-03-01",
        "validTo": "2024-03-31",
        "stores": ["Q1", " Q3 "]
    }"#;

    #[test]
    fn test_valid_form_with_preview() {
        let check = check_promotion(FORM, Some("500000")).unwrap();
        assert_eq!(check.input.store_code, "Q1,Q3");
        assert_eq!(check.discount, Some(Money::from_major(30_000)));

        let text = check_text(&check);
        assert!(text.contains("Weekday lunch"));
        assert!(text.contains("pays 470000.00"));
    }

    #[test]
    fn test_invalid_form_lists_every_problem() {
        let form = r#"{ "name": " ", "discountValue": "150", "validFrom": "2024-03-01" }"#;
        let err = check_promotion(form, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("name"));
        assert!(err.message.contains("validTo"));
        assert!(err.message.contains("discountValue"));
        assert!(err.message.contains("stores"));
    }

    #[test]
    fn test_saved_text() {
        let check = check_promotion(FORM, None).unwrap();
        assert_eq!(
            saved_text(Format::Text, "created", Some("42"), &check.input),
            "Promotion 'Weekday lunch' created (id 42)\n"
        );
        assert_eq!(
            saved_text(Format::Text, "updated", None, &check.input),
            "Promotion 'Weekday lunch' updated\n"
        );

        let json: serde_json::Value =
            serde_json::from_str(&saved_text(Format::Json, "created", Some("42"), &check.input)).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["promotion"]["storeCode"], "Q1,Q3");
    }

    #[test]
    fn test_bad_amount() {
        let err = check_promotion(FORM, Some("lots")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_not_json() {
        let err = check_promotion("name: lunch", None).unwrap_err();
        assert!(err.message.starts_with("Invalid JSON"));
    }
}
