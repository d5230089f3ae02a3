//! Release commands.

pub mod create;

pub use create::CreateRelease;
