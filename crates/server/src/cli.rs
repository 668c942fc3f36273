//! CLI argument parsing and subcommand dispatch.

use clap::{Parser, Subcommand};
use tracing::info;

use salesdash_core::Config;
use salesdash_store::seed::seed;
use salesdash_store::open_store;

use crate::report::{build_report, render_table, ReportKind};
use crate::startup;

/// Sales analytics dashboard: simulated ingestion, live aggregates and
/// infrastructure status over a shared store.
#[derive(Parser, Debug)]
#[command(name = "salesdash-server", version, about)]
pub struct Cli {
    /// Config profile; keys are read as `{PROFILE}_{KEY}` before `{KEY}`.
    #[arg(long, global = true, env = "SALESDASH_PROFILE", default_value = "")]
    pub profile: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server and the ingestion ticker (default).
    Serve {
        /// Run without the ingestion ticker, overriding TICKER_ENABLED.
        #[arg(long)]
        no_ticker: bool,
    },
    /// Insert the initial historical sales and customers.
    Seed {
        /// Insert sales even when the historical collection is not empty.
        #[arg(long)]
        force: bool,
    },
    /// Print the batch analytics over the historical collection.
    Report {
        #[arg(long, value_enum, default_value_t = ReportKind::All)]
        kind: ReportKind,
        /// Emit JSON instead of text tables.
        #[arg(long)]
        json: bool,
    },
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::for_profile(&cli.profile);

    match cli.command.unwrap_or(Command::Serve { no_ticker: false }) {
        Command::Serve { no_ticker } => {
            if no_ticker {
                config.ticker.enabled = false;
            }
            startup::serve(config).await
        }
        Command::Seed { force } => {
            let store = open_store(&config.postgres).await?;
            let outcome = seed(store.as_ref(), force).await?;
            if outcome.skipped_sales {
                info!("historical sales already present; use --force to insert them again");
            }
            println!(
                "Seeded {} sales and {} customers into {}",
                outcome.sales,
                outcome.customers,
                store.backend_name()
            );
            Ok(())
        }
        Command::Report { kind, json } => {
            let store = open_store(&config.postgres).await?;
            let report = build_report(store.as_ref(), kind).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_table(&report));
            }
            Ok(())
        }
    }
}
