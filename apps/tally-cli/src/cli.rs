//! # Command Line Definition
//!
//! ```text
//! tally [--config PATH] [--format text|json] [--store CODE]
//!       [--range SELECTOR | --from DATE --to DATE] <COMMAND>
//!
//!   dashboard                   revenue tiles, hourly orders, top products/customers
//!   sales                       paid orders by day, payment method and hour
//!   spending                    raw materials, expenses, supplier debt, net profit
//!   promotions list             promotions with scope and validity
//!   promotions check <FILE>     validate a promotion form (JSON) before saving
//!   promotions create <FILE>    validate a form and create the promotion
//!   promotions update <ID> <FILE>
//!   promotions delete <ID>
//!   settings list               general settings
//!   settings toggle <ID> <on|off>
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tally_core::date_range::{resolve, RangeSelector};
use tally_core::DateRange;

use crate::error::{CliError, CliResult};

#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Sales and spending reports for Tally POS")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Store code, or "all"
    #[arg(long, global = true)]
    pub store: Option<String>,

    #[command(flatten)]
    pub range: RangeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Report period flags.
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// today, yesterday, thisWeek, lastWeek, thisMonth, lastMonth, thisQuarter, thisYear
    #[arg(long, global = true, conflicts_with_all = ["from", "to"])]
    pub range: Option<RangeSelector>,

    /// First day of a custom range (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub from: Option<NaiveDate>,

    /// Last day of a custom range (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    /// Concrete range for `today`.
    ///
    /// `--from` alone runs through today; `--to` alone is a single day.
    pub fn resolve(&self, today: NaiveDate) -> CliResult<DateRange> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Ok(DateRange::checked(from, to)?),
            (Some(from), None) => Ok(DateRange::checked(from, today)?),
            (None, Some(to)) => Ok(DateRange::single(to)),
            (None, None) => {
                let selector = self.range.unwrap_or_default();
                resolve(selector, today).ok_or_else(|| {
                    CliError::validation(format!(
                        "range '{}' needs --from and --to",
                        selector
                    ))
                })
            }
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dashboard overview
    Dashboard,

    /// Sales report (paid orders)
    Sales,

    /// Spending report with supplier debt and net profit
    Spending,

    /// Promotion management
    #[command(subcommand)]
    Promotions(PromotionCommand),

    /// General settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Subcommand)]
pub enum PromotionCommand {
    /// List promotions
    List {
        /// Only promotions valid on this day (defaults to every promotion)
        #[arg(long)]
        valid_on: Option<NaiveDate>,
    },

    /// Validate a promotion form saved as JSON
    Check {
        file: PathBuf,

        /// Also compute the discount for this order amount
        #[arg(long)]
        amount: Option<String>,
    },

    /// Create a promotion from a form saved as JSON
    Create { file: PathBuf },

    /// Replace a promotion with the form saved as JSON
    Update { id: String, file: PathBuf },

    /// Delete a promotion
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// List general settings
    List,

    /// Switch a setting on or off
    Toggle { id: String, state: Switch },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tally", "sales", "--range", "last-month", "--store", "Q1", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Command::Sales));
        assert_eq!(cli.range.range, Some(RangeSelector::LastMonth));
        assert_eq!(cli.store.as_deref(), Some("Q1"));
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn test_range_conflicts_with_dates() {
        let err = Cli::try_parse_from(["tally", "--range", "today", "--from", "2024-03-01", "dashboard"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_resolve_ranges() {
        let today = day(3, 15);

        let default = RangeArgs::default().resolve(today).unwrap();
        assert_eq!(default, DateRange::single(today));

        let custom = RangeArgs {
            from: Some(day(3, 1)),
            to: Some(day(3, 10)),
            ..Default::default()
        };
        assert_eq!(custom.resolve(today).unwrap(), DateRange::new(day(3, 1), day(3, 10)));

        let open = RangeArgs {
            from: Some(day(3, 1)),
            ..Default::default()
        };
        assert_eq!(open.resolve(today).unwrap().end, today);

        let inverted = RangeArgs {
            from: Some(day(3, 10)),
            to: Some(day(3, 1)),
            ..Default::default()
        };
        assert!(inverted.resolve(today).is_err());

        let custom_without_dates = RangeArgs {
            range: Some(RangeSelector::Custom),
            ..Default::default()
        };
        assert!(custom_without_dates.resolve(today).is_err());
    }

    #[test]
    fn test_settings_toggle() {
        let cli = Cli::try_parse_from(["tally", "settings", "toggle", "12", "off"]).unwrap();
        match cli.command {
            Command::Settings(SettingsCommand::Toggle { id, state }) => {
                assert_eq!(id, "12");
                assert!(!state.is_on());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_promotion_mutations() {
        let cli = Cli::try_parse_from(["tally", "promotions", "update", "42", "lunch.json"]).unwrap();
        match cli.command {
            Command::Promotions(PromotionCommand::Update { id, file }) => {
                assert_eq!(id, "42");
                assert_eq!(file, PathBuf::from("lunch.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["tally", "promotions", "delete", "7", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Promotions(PromotionCommand::Delete { ref id }) if id == "7"
        ));
        assert_eq!(cli.format, Format::Json);

        assert!(Cli::try_parse_from(["tally", "promotions", "create"]).is_err());
    }
}
