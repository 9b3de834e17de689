//! SQLFS CLI Binary
//!
//! Command-line interface for stores built on the `sqlfs` library.

use anyhow::Context;
use clap::Parser;
use sqlfs::logging::init_logging;
use sqlfs::tooling::cli::{Cli, CliContext};
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = cli.load_config().context("loading configuration")?;
    init_logging(Some(&cli.logging_config(&config.logging))).context("initializing logging")?;

    let context = CliContext::new(cli.db.clone(), &config)
        .with_context(|| format!("opening store {}", cli.db.display()))?;
    let output = context.execute(&cli.command)?;
    context.fs().close()?;
    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
