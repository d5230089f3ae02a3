//! Git reference overrides for git resources declared by deployment process steps.
//!
//! Override strings look like `StepName:GitRef` (the step's primary git resource) or
//! `StepName:GitResourceName:GitRef`. A `*` git ref means the step's default branch, and a `*`
//! git resource name targets every git resource of the step.

use console::style;

use crate::{
    overrides::{BaselineEntry, MatchWeights, OverrideError, OverrideKind},
    table::Table,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct GitResourceOverrides;

pub const GIT_RESOURCE_OVERRIDE_QUESTION: &str =
    "Git resource reference override string (y to accept, u to undo, r to reset, ? for help):";

impl OverrideKind for GitResourceOverrides {
    fn noun(&self) -> &'static str {
        "git resource git ref"
    }

    fn primary_noun(&self) -> &'static str {
        "step name"
    }

    fn secondary_noun(&self) -> &'static str {
        "git resource name"
    }

    fn value_noun(&self) -> &'static str {
        "git ref"
    }

    // ':' takes precedence; mixing delimiters leaves the '=' inside the step name
    fn delimiters(&self, raw: &str) -> &'static [char] {
        if raw.contains(':') { &[':'] } else { &['='] }
    }

    fn validate_value(&self, _value: &str) -> Result<(), OverrideError> {
        Ok(())
    }

    fn allows_wildcard_primary(&self) -> bool {
        false
    }

    fn empty_secondary_is_wildcard(&self) -> bool {
        false
    }

    fn match_weights(&self) -> MatchWeights {
        MatchWeights::EXACT
    }

    fn question(&self) -> &'static str {
        GIT_RESOURCE_OVERRIDE_QUESTION
    }

    fn help_text(&self) -> String {
        let bold = |s: &str| style(s).bold().to_string();
        let green = |s: &str| style(s).green().to_string();
        let dim = |s: &str| style(s).dim().to_string();

        [
            bold("GIT RESOURCE SELECTION"),
            " This screen presents the list of Git resources used by your project, and the steps".to_string(),
            " which reference them.".to_string(),
            String::new(),
            bold("COMMANDS"),
            " At any point, you can enter one of the following:".to_string(),
            format!(" - {} to access this help screen", green("?")),
            format!(" - {} to accept the list of Git resources and proceed with creating the release", green("y")),
            format!(" - {} to undo the last edit you made to Git resource Git refs", green("u")),
            format!(" - {} to reset all Git resource Git ref edits", green("r")),
            " - A Git resource Git ref override string.".to_string(),
            String::new(),
            bold("GIT RESOURCE OVERRIDE STRINGS"),
            " Git resource override strings must have 2 or 3 components, separated by a : or =".to_string(),
            " The first component is always the step name. The last component is always the target Git ref.".to_string(),
            " When specifying 2 components, it is assumed that this is for the primary git resource.".to_string(),
            " When specifying 3 components, the second component is the name of the Git resource.".to_string(),
            " You can specify a * for the Git ref which will default to the step-defined default branch.".to_string(),
            " You can specify a * for the Git resource name to target every Git resource in the step.".to_string(),
            String::new(),
            " Examples:".to_string(),
            format!(
                "   {}   {}",
                bold("Run Script:refs/heads/my-branch"),
                dim("# sets primary Git resource in the 'Run Script' step to use the 'refs/heads/my-branch' ref")
            ),
            format!(
                "   {}   {}",
                bold("Deploy helm:TemplateValues-1:refs/tags/1.3.2"),
                dim("# sets the 'TemplateValues-1' Git resource in the 'Deploy helm' step to use the 'refs/tags/1.3.2' ref")
            ),
            format!(
                "   {}              {}",
                bold("Run Script:*"),
                dim("# sets primary Git resource in the 'Run Script' step to use the step-defined default branch")
            ),
            String::new(),
            dim("---------------------------------------------------------------------"),
            String::new(),
        ]
        .join("\n")
    }

    fn table(&self, entries: &[BaselineEntry]) -> Table {
        Table::new(
            vec![
                style("STEP NAME").bold().to_string(),
                style("GIT RESOURCE").bold().to_string(),
                style("GIT REF").bold().to_string(),
            ],
            entries
                .iter()
                .map(|entry| {
                    let name = if entry.secondary.is_empty() {
                        "<primary>".to_string()
                    } else {
                        entry.secondary.clone()
                    };
                    vec![entry.action_name.clone(), name, entry.value.clone()]
                })
                .collect(),
        )
    }

    fn forced_resolution_question(&self, _entry: &BaselineEntry) -> Option<String> {
        None
    }
}
