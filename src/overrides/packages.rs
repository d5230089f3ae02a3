//! Package version overrides.
//!
//! Override strings look like `PackageIdOrStepName:Version` or
//! `PackageIdOrStepName:PackageReferenceName:Version`, where `/` and `=` may be used in place of `:`.

use std::sync::LazyLock;

use console::style;
use regex::Regex;

use crate::{
    overrides::{BaselineEntry, MatchWeights, OverrideError, OverrideKind},
    table::Table,
};

// Same grammar as the deployment server's version parser, minus support
// for whitespace around the dots.
static VALID_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(v|V)?\d+(\.\d+)?(\.\d+)?(\.\d+)?[.\-_\\]?([a-z0-9]*?)([.\-_\\]([a-z0-9.\-_\\]*?)?)?(\+([a-z0-9_\-.\\+]*?))?$",
    )
    .expect("version regex is valid")
});

/// Whether `version` looks like a package version (`1`, `v1.2`, `9.7-pre-xyz`, `1.2.3.4+meta`, ...).
pub fn is_valid_version(version: &str) -> bool {
    VALID_VERSION.is_match(version)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageOverrides;

pub const PACKAGE_OVERRIDE_QUESTION: &str =
    "Package override string (y to accept, u to undo, r to reset, ? for help):";

impl OverrideKind for PackageOverrides {
    fn noun(&self) -> &'static str {
        "package version"
    }

    fn primary_noun(&self) -> &'static str {
        "step name or package"
    }

    fn secondary_noun(&self) -> &'static str {
        "package reference name"
    }

    fn value_noun(&self) -> &'static str {
        "version"
    }

    fn delimiters(&self, _raw: &str) -> &'static [char] {
        &[':', '/', '=']
    }

    fn validate_value(&self, value: &str) -> Result<(), OverrideError> {
        if is_valid_version(value) {
            Ok(())
        } else {
            Err(OverrideError::InvalidVersion(value.to_string()))
        }
    }

    fn allows_wildcard_primary(&self) -> bool {
        true
    }

    fn empty_secondary_is_wildcard(&self) -> bool {
        true
    }

    fn match_weights(&self) -> MatchWeights {
        MatchWeights::SERVER
    }

    fn question(&self) -> &'static str {
        PACKAGE_OVERRIDE_QUESTION
    }

    fn help_text(&self) -> String {
        let bold = |s: &str| style(s).bold().to_string();
        let green = |s: &str| style(s).green().to_string();
        let dim = |s: &str| style(s).dim().to_string();

        [
            bold("PACKAGE SELECTION"),
            " This screen presents the list of packages used by your project, and the steps".to_string(),
            " which reference them.".to_string(),
            " If an item is dimmed (gray text) this indicates that the attribute is duplicated.".to_string(),
            " For example if you reference the same package in two steps, the second will be dimmed.".to_string(),
            String::new(),
            bold("COMMANDS"),
            " At any point, you can enter one of the following:".to_string(),
            format!(" - {} to access this help screen", green("?")),
            format!(" - {} to accept the list of packages and proceed", green("y")),
            format!(" - {} to undo the last edit you made to package versions", green("u")),
            format!(" - {} to reset all package version edits", green("r")),
            " - A package override string.".to_string(),
            String::new(),
            bold("PACKAGE OVERRIDE STRINGS"),
            " Package override strings must have 2 or 3 components, separated by a :".to_string(),
            " The last component must always be a version number.".to_string(),
            String::new(),
            " When specifying 2 components, the first component is either a Package ID or a Step Name.".to_string(),
            " You can also specify a * which will match all packages".to_string(),
            " Examples:".to_string(),
            format!("   {}   {}", bold("octopustools:9.1"), dim("# sets package 'octopustools' in all steps to v 9.1")),
            format!("   {}   {}", bold("Push Package:3.0"), dim("# sets all packages in the 'Push Package' step to v 3.0")),
            format!("   {}              {}", bold("*:5.1"), dim("# sets all packages in all steps to v 5.1")),
            String::new(),
            " The 3-component syntax is for advanced use cases where you reference the same package twice".to_string(),
            " in a single step, and need to distinguish between the two.".to_string(),
            format!(" The syntax is {}", bold("packageIDorStepName:packageReferenceName:version")),
            " Please refer to the Octopus Server documentation for more information regarding package reference names.".to_string(),
            String::new(),
            dim("---------------------------------------------------------------------"),
            String::new(),
        ]
        .join("\n")
    }

    fn table(&self, entries: &[BaselineEntry]) -> Table {
        package_table(entries)
    }

    fn forced_resolution_question(&self, entry: &BaselineEntry) -> Option<String> {
        Some(format!(
            "Unable to find a version for \"{}\". Specify a version:",
            entry.resource_id.as_deref().unwrap_or(&entry.action_name)
        ))
    }
}

struct PackageRow {
    package_id: String,
    version: String,
    step: String,
    duplicate: bool,
}

/// Build the package table.
///
/// Rows with the same package id and version as an earlier row are moved directly below it
/// and dimmed.
fn package_table(entries: &[BaselineEntry]) -> Table {
    let mut rows: Vec<PackageRow> = Vec::with_capacity(entries.len());

    for entry in entries {
        let package_id = entry.resource_id.clone().unwrap_or_default();

        // the common case is that the reference name equals the package id; dim it when it does
        let reference_suffix = format!("/{}", entry.secondary);
        let step = if package_id == entry.secondary {
            format!("{}{}", entry.action_name, style(reference_suffix).dim())
        } else {
            format!("{}{}", entry.action_name, reference_suffix)
        };

        let group_end = rows
            .iter()
            .rposition(|row| row.package_id == package_id && row.version == entry.value);

        let row = PackageRow {
            package_id,
            version: entry.value.clone(),
            step,
            duplicate: group_end.is_some(),
        };

        match group_end {
            Some(index) => rows.insert(index + 1, row),
            None => rows.push(row),
        }
    }

    Table::new(
        vec![
            style("PACKAGE").bold().to_string(),
            style("VERSION").bold().to_string(),
            style("STEP NAME/PACKAGE REFERENCE").bold().to_string(),
        ],
        rows.into_iter()
            .map(|row| {
                let version = if row.version.is_empty() {
                    style("unknown").yellow().to_string()
                } else if row.duplicate {
                    style(row.version).dim().to_string()
                } else {
                    row.version
                };
                let package_id = if row.duplicate {
                    style(row.package_id).dim().to_string()
                } else {
                    row.package_id
                };
                vec![package_id, version, row.step]
            })
            .collect(),
    )
}
