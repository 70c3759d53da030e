//! `eduflow-cli` entry point.

use anyhow::Result;
use clap::Parser;
use eduflow_cli::{cli::Cli, commands};
use eduflow_runtime::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Logs go to stderr; stdout carries the JSON result only.
    let _guard = init_logging(&cli.logging_options())?;
    commands::run(cli).await
}
