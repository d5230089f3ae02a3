//! Strategy trait that parameterizes the override engine.
//!
//! Packages and git resources share the parse/resolve/apply pipeline and the confirmation loop.
//! What differs between them (delimiters, value validation, wildcard rules, match priorities,
//! and how the current state is displayed) is described by an [`OverrideKind`].

use crate::{
    overrides::{BaselineEntry, OverrideError},
    table::Table,
};

/// Score assigned to each way an override can match a baseline entry.
///
/// `None` disables that kind of match entirely. The highest score wins, ties go to the
/// entry that comes first in the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchWeights {
    pub step_and_secondary: Option<u32>,
    pub resource_and_secondary: Option<u32>,
    pub secondary_only: Option<u32>,
    pub step_only: Option<u32>,
    pub resource_only: Option<u32>,
}

impl MatchWeights {
    /// Same priorities the deployment server uses when resolving package overrides.
    pub const SERVER: Self = Self {
        step_and_secondary: Some(100),
        resource_and_secondary: Some(90),
        secondary_only: Some(80),
        step_only: Some(50),
        resource_only: Some(40),
    };

    /// Only an exact step + secondary match is accepted.
    pub const EXACT: Self = Self {
        step_and_secondary: Some(100),
        resource_and_secondary: None,
        secondary_only: None,
        step_only: None,
        resource_only: None,
    };
}

pub trait OverrideKind: Copy + Send + 'static {
    /// What an override string specifies, used in error messages, e.g. "package version".
    fn noun(&self) -> &'static str;

    fn primary_noun(&self) -> &'static str;

    fn secondary_noun(&self) -> &'static str;

    fn value_noun(&self) -> &'static str;

    /// Delimiters to tokenize `raw` with.
    fn delimiters(&self, raw: &str) -> &'static [char];

    /// Check the value component of an override string.
    fn validate_value(&self, value: &str) -> Result<(), OverrideError>;

    /// Whether an empty or `*` primary is accepted as "every step".
    fn allows_wildcard_primary(&self) -> bool;

    /// Whether an empty secondary on a resolved override means "any secondary"
    /// rather than "the primary resource of the step".
    fn empty_secondary_is_wildcard(&self) -> bool;

    fn match_weights(&self) -> MatchWeights;

    /// Question asked on every iteration of the confirmation loop.
    fn question(&self) -> &'static str;

    fn help_text(&self) -> String;

    /// Render the current state of the overrides.
    fn table(&self, entries: &[BaselineEntry]) -> Table;

    /// Question asked for an entry without a value before normal editing may begin.
    ///
    /// Kinds that never need a value to be forced return `None`.
    fn forced_resolution_question(&self, entry: &BaselineEntry) -> Option<String>;
}
