//! Payloads exchanged with the deployment server's REST API.
//!
//! Resource models use the server's PascalCase field names; the `releases/create/v1` command
//! endpoint uses camelCase.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A page of resources.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resources<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistenceSettings {
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_version_controlled: bool,
    #[serde(default)]
    pub persistence_settings: Option<PersistenceSettings>,
    /// Not inlined for version-controlled projects; see [`DeploymentSettings`].
    #[serde(default)]
    pub versioning_strategy: Option<VersioningStrategy>,
}

impl Project {
    /// The branch used to load the deployment process of a version-controlled project.
    pub fn default_branch(&self) -> Option<&str> {
        self.persistence_settings
            .as_ref()
            .and_then(|settings| settings.default_branch.as_deref())
    }
}

/// How release versions are chosen.
///
/// Without a donor package the server's template is used, see
/// [`DeploymentProcessTemplate::next_version_increment`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersioningStrategy {
    #[serde(default)]
    pub donor_package: Option<ActionPackage>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentSettings {
    #[serde(default)]
    pub versioning_strategy: Option<VersioningStrategy>,
}

/// A branch or tag of a version-controlled project's repository.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitReference {
    pub name: String,
    pub canonical_name: String,
}

/// A (step, package reference) pair a channel rule or versioning strategy points at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionPackage {
    pub deployment_action: String,
    #[serde(default)]
    pub package_reference: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelRule {
    #[serde(default)]
    pub action_packages: Vec<ActionPackage>,
    #[serde(default)]
    pub version_range: String,
    #[serde(default)]
    pub tag: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<ChannelRule>,
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A package referenced by a deployment process step, as described by the release template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseTemplatePackage {
    pub action_name: String,
    #[serde(rename = "PackageId")]
    pub package_id: String,
    #[serde(default)]
    pub package_reference_name: String,
    #[serde(rename = "FeedId", default)]
    pub feed_id: String,
    #[serde(default)]
    pub is_resolvable: bool,
    #[serde(default)]
    pub fixed_version: Option<String>,
}

impl ReleaseTemplatePackage {
    pub fn has_fixed_version(&self) -> bool {
        self.fixed_version.as_deref().is_some_and(|v| !v.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseTemplateGitResource {
    pub action_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub repository_uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentProcessTemplate {
    #[serde(default)]
    pub next_version_increment: String,
    #[serde(default)]
    pub packages: Vec<ReleaseTemplatePackage>,
    #[serde(default)]
    pub git_resources: Vec<ReleaseTemplateGitResource>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feed {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageVersion {
    pub version: String,
    #[serde(rename = "PackageId", default)]
    pub package_id: String,
}

/// Query for the best available version of a package in a feed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackageVersionQuery {
    pub package_id: String,
    pub take: u32,
    pub version_range: Option<String>,
    pub pre_release_tag: Option<String>,
}

impl PackageVersionQuery {
    pub fn latest(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            take: 1,
            ..Default::default()
        }
    }

    /// Query string parameters, omitting unset filters.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("packageId", self.package_id.clone()),
            ("take", self.take.to_string()),
        ];
        if let Some(version_range) = &self.version_range {
            pairs.push(("versionRange", version_range.clone()));
        }
        if let Some(pre_release_tag) = &self.pre_release_tag {
            pairs.push(("preReleaseTag", pre_release_tag.clone()));
        }
        pairs
    }
}

/// Body of `POST /api/{space}/releases/create/v1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReleaseCommand {
    pub space_id_or_name: String,
    pub project_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub channel_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub release_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub package_version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub git_resources: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_ref: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_commit: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub release_notes: String,
    pub ignore_if_already_exists: bool,
    pub ignore_channel_rules: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReleaseResponse {
    pub release_id: String,
    pub release_version: String,
}
