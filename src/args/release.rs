use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Manage releases.
#[derive(Subcommand)]
pub enum Release {
    #[command(alias = "new")]
    Create(Create),
}

/// Create a release.
///
/// Package versions and git references default to what the server proposes, and can be changed
/// with override strings.
/// Package overrides look like `PackageIdOrStepName:Version` or
/// `PackageIdOrStepName:PackageReferenceName:Version`; `*` matches everything.
/// Git resource overrides look like `StepName:GitRef` or `StepName:GitResourceName:GitRef`;
/// a `*` git ref selects the step's default branch and a `*` git resource name targets every
/// git resource of the step.
#[derive(Parser, Debug, Default)]
pub struct Create {
    /// Name or ID of the project to create the release in.
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Name of the channel to use.
    #[arg(long, short = 'c')]
    pub channel: Option<String>,

    /// Override the release version.
    #[arg(long, short = 'v')]
    pub version: Option<String>,

    /// Default version to use for all packages.
    #[arg(long)]
    pub package_version: Option<String>,

    /// Version specification for a package; may be given multiple times.
    #[arg(long = "package", value_name = "OVERRIDE")]
    pub packages: Vec<String>,

    /// Git reference for a git resource; may be given multiple times.
    #[arg(long = "git-resource", value_name = "OVERRIDE")]
    pub git_resources: Vec<String>,

    /// Git reference to use when loading a version-controlled deployment process.
    #[arg(long, short = 'r')]
    pub git_ref: Option<String>,

    /// Git commit to use together with --git-ref.
    #[arg(long)]
    pub git_commit: Option<String>,

    /// Release notes.
    #[arg(long, short = 'n')]
    pub release_notes: Option<String>,

    /// Read the release notes from a file.
    #[arg(long, value_name = "FILE", conflicts_with = "release_notes")]
    pub release_notes_file: Option<PathBuf>,

    /// Don't fail if a release with the same version already exists.
    #[arg(long, short = 'x')]
    pub ignore_existing: bool,

    /// Allow versions that violate the channel's version rules.
    #[arg(long)]
    pub ignore_channel_rules: bool,
}
