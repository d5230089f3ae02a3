//! Validator for release version strings.

use anyhow::Result;

use crate::{
    interaction::{InputValidator, InputValidatorResult},
    overrides::is_valid_version,
};

/// Validator for release version strings.
///
/// Blank input is accepted so the prompt falls back to its default (the server's next version
/// increment). Anything else has to look like a version number, e.g. `1.2.3` or `1.2.3-beta.1`.
#[derive(Clone)]
pub struct ReleaseVersionValidator;

impl InputValidator for ReleaseVersionValidator {
    fn validate(&self, input: &str) -> Result<InputValidatorResult> {
        let input = input.trim();
        if input.is_empty() || is_valid_version(input) {
            return Ok(InputValidatorResult::Valid);
        }

        Ok(InputValidatorResult::Invalid(format!(
            "\"{input}\" is not a valid release version"
        )))
    }
}
