//! # Report Commands

use tracing::debug;

use super::Context;
use crate::cli::RangeArgs;
use crate::error::CliResult;
use crate::output::{dashboard_text, render, sales_text, spending_text};

pub async fn dashboard(ctx: &Context, range: &RangeArgs) -> CliResult<String> {
    let range = range.resolve(ctx.today)?;
    debug!(%range, store = %ctx.store, "dashboard command");

    let stats = ctx.service.dashboard(range, &ctx.store, ctx.today).await?;
    render(ctx.format, &stats, dashboard_text)
}

pub async fn sales(ctx: &Context, range: &RangeArgs) -> CliResult<String> {
    let range = range.resolve(ctx.today)?;
    debug!(%range, store = %ctx.store, "sales command");

    let report = ctx.service.sales(range, &ctx.store).await?;
    render(ctx.format, &report, sales_text)
}

pub async fn spending(ctx: &Context, range: &RangeArgs) -> CliResult<String> {
    let range = range.resolve(ctx.today)?;
    debug!(%range, store = %ctx.store, "spending command");

    let summary = ctx.service.spending(range, &ctx.store).await?;
    render(ctx.format, &summary, spending_text)
}
