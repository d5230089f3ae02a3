//! This module contains business logic for the commands for the application.
//!
//! The main entry point is the [`command_from_args`] function which converts CLI arguments into a command.
use anyhow::Result;

use crate::{
    args::{GlobalArgs, OctopusArgs, Release},
    commands::release::CreateRelease,
};
pub use core::{Command, CommandWithOutput, CommandWithOutputExt};

mod core;
pub mod release;
mod validators;

/// Convert CLI arguments into a command.
///
/// This function is the main entry point for the command execution logic.
/// It converts the CLI arguments into a command and returns it.
///
/// The output of the command will be formatted using the output format from the global
/// arguments and printed to stdout.
pub fn command_from_args(args: OctopusArgs, global_args: &GlobalArgs) -> Result<Box<dyn Command>> {
    match args {
        OctopusArgs::Release(release_args) => match release_args {
            Release::Create(create_args) => CreateRelease::try_from((create_args, global_args))?
                .with_print_to_stdout(global_args.output),
        },
    }
}
