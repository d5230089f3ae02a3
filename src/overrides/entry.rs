//! Data model shared by both override kinds.

use std::fmt::Display;

use serde::Serialize;

/// Wildcard used in override strings.
///
/// In a coordinate it matches everything, as a value it means "keep the baseline value".
pub const WILDCARD: &str = "*";

/// One step + resource binding, as computed from the server template.
///
/// `action_name` is always the exact step name. `resource_id` is the package id for packages
/// and `None` for git resources. `secondary` is the package reference name or git resource name,
/// empty for the primary resource of a step. `value` is the version or git ref, and is empty
/// when no default could be determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineEntry {
    pub action_name: String,
    pub resource_id: Option<String>,
    pub secondary: String,
    pub value: String,
}

impl BaselineEntry {
    pub fn is_unresolved(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// An override as typed by the user, before we know whether `primary` names a step or a resource.
///
/// An empty `primary` is a wildcard. An empty `secondary` is a wildcard for packages and names
/// the step's primary resource for git resources, which spell "any resource" as `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousOverride {
    pub primary: String,
    pub secondary: String,
    pub value: String,
}

/// How a resolved override constrains the secondary coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryMatch {
    Any,
    Exact(String),
}

/// An override that has been matched against a baseline.
///
/// `action_name` is set when the primary matched a step name, `resource_id` when it matched a
/// resource identifier. When neither is set the override applies to every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOverride {
    pub action_name: Option<String>,
    pub resource_id: Option<String>,
    pub secondary: SecondaryMatch,
    pub value: String,
}

impl ResolvedOverride {
    /// An override that matches every baseline entry.
    pub fn universal(value: impl Into<String>) -> Self {
        Self {
            action_name: None,
            resource_id: None,
            secondary: SecondaryMatch::Any,
            value: value.into(),
        }
    }

    pub fn matches(&self, entry: &BaselineEntry) -> bool {
        let action_matches = self
            .action_name
            .as_ref()
            .is_none_or(|action_name| *action_name == entry.action_name);

        let resource_matches = self
            .resource_id
            .as_ref()
            .is_none_or(|resource_id| entry.resource_id.as_ref() == Some(resource_id));

        let secondary_matches = match &self.secondary {
            SecondaryMatch::Any => true,
            SecondaryMatch::Exact(secondary) => *secondary == entry.secondary,
        };

        action_matches && resource_matches && secondary_matches
    }
}

/// Render the override as a string the server can parse, e.g. `StepName:Version`.
///
/// This is the inverse of parsing: the resource id wins over the step name, and an
/// override without a primary is written with a `*` placeholder.
impl Display for ResolvedOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut components: Vec<&str> = Vec::with_capacity(3);

        let primary = self
            .resource_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.action_name.as_deref().filter(|name| !name.is_empty()));
        if let Some(primary) = primary {
            components.push(primary);
        }

        match &self.secondary {
            SecondaryMatch::Exact(secondary) if !secondary.is_empty() => {
                if components.is_empty() {
                    components.push(WILDCARD);
                }
                components.push(secondary);
            }
            _ => {}
        }

        // The server can't deal with a bare value; it needs *:value
        if components.is_empty() {
            components.push(WILDCARD);
        }
        components.push(&self.value);

        write!(f, "{}", components.join(":"))
    }
}
