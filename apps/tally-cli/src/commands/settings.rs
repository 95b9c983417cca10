//! # Settings Commands

use serde_json::json;
use tracing::info;

use super::Context;
use crate::cli::{Format, SettingsCommand};
use crate::error::CliResult;
use crate::output::{render, settings_text};

pub async fn run(ctx: &Context, command: &SettingsCommand) -> CliResult<String> {
    let api = ctx.service.api();
    match command {
        SettingsCommand::List => {
            let settings = api.general_settings().await?;
            render(ctx.format, &settings, |s| settings_text(s))
        }
        SettingsCommand::Toggle { id, state } => {
            api.set_setting_active(id, state.is_on()).await?;
            info!(id = %id, active = state.is_on(), "Setting toggled");
            Ok(match ctx.format {
                Format::Json => json!({ "id": id, "isActive": state.is_on() }).to_string(),
                Format::Text => format!(
                    "Setting {} is now {}\n",
                    id,
                    if state.is_on() { "on" } else { "off" }
                ),
            })
        }
    }
}
