//! Output formats for command results.
//!
//! Results are printed as human readable text by default, or as JSON for scripts (`-o json`).
use std::fmt::Display;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Types that can be rendered in every [`Format`].
pub trait Formattable {
    fn format(&self, format: Format) -> Result<String>;
}

/// Text uses [`Display`], JSON uses [`Serialize`].
impl<T> Formattable for T
where
    T: Display + Serialize,
{
    fn format(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Text => self.to_string(),
            Format::Json => serde_json::to_string(self).context("serializing to json")?,
        })
    }
}
