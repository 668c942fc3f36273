mod api;
mod cli;
mod pages;
mod panels;
mod probe;
mod report;
mod router;
mod startup;
mod state;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    salesdash_core::config::load_dotenv();
    let cli = cli::Cli::parse();
    cli::dispatch(cli).await
}
