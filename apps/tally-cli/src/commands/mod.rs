//! # Commands Module
//!
//! One function per subcommand. Each returns the rendered output so the
//! caller decides where it goes.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (Context + dispatch)
//! ├── report.rs     ◄─── dashboard, sales, spending
//! ├── promotion.rs  ◄─── promotions list / check
//! └── settings.rs   ◄─── settings list / toggle
//! ```
//!
//! ## Context
//! Commands share one [`Context`]: the resolved store filter, the local
//! "today", the output format and the report service. Nothing is global.

pub mod promotion;
pub mod report;
pub mod settings;

use chrono::{NaiveDate, Utc};
use tally_client::{ClientConfig, ReportService};
use tally_core::StoreFilter;

use crate::cli::{Cli, Command, Format};
use crate::error::CliResult;

/// Everything a command needs.
#[derive(Debug)]
pub struct Context {
    pub service: ReportService,
    pub store: StoreFilter,
    pub today: NaiveDate,
    pub format: Format,
}

impl Context {
    /// Builds the context from configuration plus command-line overrides.
    pub async fn new(cli: &Cli, config: &ClientConfig) -> CliResult<Self> {
        let store = match &cli.store {
            Some(store) => store.parse()?,
            None => config.store_filter()?,
        };
        let offset = config.utc_offset()?;
        let today = Utc::now().with_timezone(&offset).date_naive();

        Ok(Context {
            service: ReportService::from_config(config).await?,
            store,
            today,
            format: cli.format,
        })
    }
}

/// Runs the parsed command.
pub async fn dispatch(cli: &Cli, ctx: &Context) -> CliResult<String> {
    match &cli.command {
        Command::Dashboard => report::dashboard(ctx, &cli.range).await,
        Command::Sales => report::sales(ctx, &cli.range).await,
        Command::Spending => report::spending(ctx, &cli.range).await,
        Command::Promotions(command) => promotion::run(ctx, command).await,
        Command::Settings(command) => settings::run(ctx, command).await,
    }
}
