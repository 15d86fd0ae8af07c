//! Drowsiness Monitor - Main Entry Point

use anyhow::Context;
use clap::Parser;
use monitor::{init_logging, run, Cli, MonitorConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = MonitorConfig::load(cli.config_path()).context("loading configuration")?;

    init_logging(&config.logging);

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let summary = run(&config).await.context("monitoring session failed")?;
    info!(
        "Session ended in {} after {} classified ticks",
        summary.final_status, summary.classified_ticks
    );

    Ok(())
}
