//! Connection settings for the deployment server.
//!
//! Values come from the global flags, which fall back to `OCTOPUS_URL`, `OCTOPUS_API_KEY` and
//! `OCTOPUS_SPACE`. Nothing is persisted.
use thiserror::Error;
use url::Url;

use crate::args;

pub const DEFAULT_SPACE: &str = "Spaces-1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no server URL configured; pass --server or set OCTOPUS_URL")]
    MissingServer,
    #[error("invalid server URL \"{url}\": {reason}")]
    InvalidServer { url: String, reason: String },
    #[error("no API key configured; pass --api-key or set OCTOPUS_API_KEY")]
    MissingApiKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub url: Url,
    pub api_key: String,
    pub space: String,
}

impl TryFrom<&args::GlobalArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: &args::GlobalArgs) -> Result<Self, Self::Error> {
        let server = args
            .server
            .as_deref()
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .ok_or(ConfigError::MissingServer)?;

        let url = Url::parse(server).map_err(|e| ConfigError::InvalidServer {
            url: server.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidServer {
                url: server.to_string(),
                reason: format!("unsupported scheme \"{}\"", url.scheme()),
            });
        }

        let api_key = args
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        let space = match args.space.trim() {
            "" => DEFAULT_SPACE.to_string(),
            space => space.to_string(),
        };

        Ok(ServerConfig {
            url,
            api_key,
            space,
        })
    }
}
