//! Override resolution engine.
//!
//! Releases pick a package version for every package a deployment process references, and a
//! git ref for every git resource. The server proposes defaults (the baseline); users adjust
//! them with override strings such as `pterm:1.2.3` or `Run Script:refs/heads/main`, given on
//! the command line or typed into an interactive loop.
//!
//! The flow is the same for both kinds of override:
//! - [`split`] and [`parse_override`] turn a string into an [`AmbiguousOverride`], whose first
//!   component may name a step or a resource.
//! - [`resolve_override`] matches it against the baseline and produces a [`ResolvedOverride`].
//! - [`apply_overrides`] layers resolved overrides on the baseline.
//! - [`OverrideSession`] keeps the override list with undo/reset, and [`run_override_loop`]
//!   drives it from a prompt.
//!
//! What differs between packages and git resources is captured by [`OverrideKind`], implemented
//! by [`PackageOverrides`] and [`GitResourceOverrides`].
mod apply;
mod baseline;
mod entry;
mod error;
mod git_resources;
mod kind;
mod packages;
mod parse;
mod prompt_loop;
mod resolve;
mod session;
mod split;

pub use apply::{apply_overrides, expand_secondary_wildcards};
pub use baseline::{BaselineError, build_git_resource_baseline, build_package_baseline};
pub use entry::{AmbiguousOverride, BaselineEntry, ResolvedOverride, SecondaryMatch, WILDCARD};
pub use error::OverrideError;
pub use git_resources::{GIT_RESOURCE_OVERRIDE_QUESTION, GitResourceOverrides};
pub use kind::{MatchWeights, OverrideKind};
pub use packages::{PACKAGE_OVERRIDE_QUESTION, PackageOverrides, is_valid_version};
pub use parse::parse_override;
pub use prompt_loop::{LoopCommand, OverrideLoopError, interpret, run_override_loop};
pub use resolve::resolve_override;
pub use session::{OverrideOutcome, OverrideSession};
pub use split::split;
