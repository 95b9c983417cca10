//! # tally-cli Library
//!
//! Command-line front end for the Tally POS reports.
//!
//! ## Module Organization
//! ```text
//! tally_cli/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── cli.rs          ◄─── clap definitions, range flags
//! ├── commands/
//! │   ├── mod.rs      ◄─── Context + dispatch
//! │   ├── report.rs   ◄─── dashboard, sales, spending
//! │   ├── promotion.rs◄─── promotions list / check / save
//! │   └── settings.rs ◄─── settings list / toggle
//! ├── output.rs       ◄─── text and JSON rendering
//! └── error.rs        ◄─── CliError for commands
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

use std::process::ExitCode;

use clap::Parser;
use tally_client::ClientConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Format};
use commands::Context;
use error::{CliError, CliResult};

/// Runs the CLI and maps the outcome to a process exit code.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                          CLI Startup                                    │
/// │                                                                         │
/// │  1. Parse Arguments ──────────────────────────────────────────────────► │
/// │     • clap derive, global flags usable after the subcommand             │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: info,tally=debug, override with RUST_LOG                 │
/// │                                                                         │
/// │  3. Load Configuration ───────────────────────────────────────────────► │
/// │     • --config or ~/.config/tally-pos/client.toml                       │
/// │     • TALLY_* environment overrides                                     │
/// │                                                                         │
/// │  4. Build Context ────────────────────────────────────────────────────► │
/// │     • Session from the token file, transport, report service           │
/// │                                                                         │
/// │  5. Dispatch ─────────────────────────────────────────────────────────► │
/// │     • stdout: report   • stderr: error as text or JSON, exit 1         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match execute(&cli).await {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(code = ?err.code, message = %err.message, "Command failed");
            eprintln!("{}", format_error(&err, cli.format));
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli) -> CliResult<String> {
    let config = ClientConfig::load(cli.config.clone())?;
    info!(base_url = %config.api.base_url, "Configuration loaded");

    let ctx = Context::new(cli, &config).await?;
    commands::dispatch(cli, &ctx).await
}

fn format_error(err: &CliError, format: Format) -> String {
    match format {
        Format::Json => serde_json::to_string(err).unwrap_or_else(|_| err.message.clone()),
        Format::Text => format!("error: {}", err.message),
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_client=trace` - Show trace for the client only
/// - Default: INFO, DEBUG for tally crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
