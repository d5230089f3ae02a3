//! Validators for user input in the release commands.

pub mod release_version;

pub use release_version::ReleaseVersionValidator;
