//! Root command for the CLI.
//!
//! The commands are defined in the [`OctopusArgs`](super::OctopusArgs) enum.
use clap::{Args, Parser};

use crate::{config::DEFAULT_SPACE, formatting::Format};

use super::OctopusArgs;

/// Command line client for Octopus Deploy
#[derive(Parser)]
#[command(name = "octopus", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global_args: GlobalArgs,

    #[command(subcommand)]
    pub command: OctopusArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging.
    ///
    /// Setting this flag will set the log level to debug and only show logs from this crate.
    /// The log level can also be set with the `OCTOPUS_LOG` environment variable.
    /// If the `OCTOPUS_LOG_ALL` environment variable is set, logs from all crates are shown.
    #[arg(global = true, hide = true, long, short = 'D', default_value = "false")]
    pub debug: bool,

    /// Output format.
    #[arg(global = true, long, short = 'o', value_enum, default_value = "text")]
    pub output: Format,

    /// URL of the Octopus Server.
    #[arg(global = true, long, env = "OCTOPUS_URL")]
    pub server: Option<String>,

    /// API key used to authenticate with the Octopus Server.
    #[arg(global = true, long, env = "OCTOPUS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Name or ID of the space to work in.
    #[arg(global = true, long, env = "OCTOPUS_SPACE", default_value = DEFAULT_SPACE)]
    pub space: String,

    /// Disable prompting in interactive mode.
    #[arg(global = true, long)]
    pub no_prompt: bool,
}
