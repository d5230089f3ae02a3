use anyhow::Result;
use clap::Parser;

use crate::{args::Cli, commands::command_from_args, logging::setup_logging};

mod args;
mod commands;
mod config;
mod dependencies;
mod formatting;
mod interaction;
mod logging;
mod models;
mod overrides;
mod table;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.global_args.debug);

    let mut command = command_from_args(cli.command, &cli.global_args)?;
    command.execute().await
}
