//! This module defines traits for external dependencies (the deployment server's REST API) to make
//! them easier to mock and substitute in tests. Commands depend on these traits rather than on the
//! HTTP client directly.
pub mod octopus;

pub use octopus::*;
