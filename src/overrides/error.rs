use thiserror::Error;

/// Errors produced while turning an override string into a resolved override.
///
/// All of these are recoverable: inside the interactive loop they are shown next to the
/// re-asked question, and for overrides seeded from the command line they are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideError {
    #[error("{0}")]
    InvalidFormat(String),
    #[error("version component \"{0}\" is not a valid version")]
    InvalidVersion(String),
    #[error("could not resolve {primary_noun} \"{primary}\" or {secondary_noun} \"{secondary}\"")]
    Unresolvable {
        primary_noun: &'static str,
        primary: String,
        secondary_noun: &'static str,
        secondary: String,
    },
}
