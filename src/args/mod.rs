//! CLI argument parsing layer.
//!
//! This module provides the CLI interface using clap derive macros.
//! It handles parsing command-line arguments and converting them into structured data types.
//!
//! The business logic layer is [`crate::commands`], which receives these parsed arguments.

use clap::Subcommand;

mod cli;
mod release;

pub use cli::{Cli, GlobalArgs};
pub use release::*;

/// Root command enum.
#[derive(Subcommand)]
pub enum OctopusArgs {
    #[command(subcommand)]
    Release(Release),
}
