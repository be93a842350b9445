//! Strata - block execution node.

use clap::Parser;
use eyre::Result;

mod check;
mod cli;

fn main() -> Result<()> {
    strata_cli::Backtracing::enable();

    let cli = cli::Cli::parse();

    tracing_subscriber::fmt().with_env_filter(if cli.verbose { "debug" } else { "info" }).init();

    cli.run()
}
