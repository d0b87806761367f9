use anyhow::Result;
use clap::Parser;
use orderdesk_cli::{logging, run, Args};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let args = Args::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "starting orderdesk");

    run(args).await?;
    Ok(())
}
