use crate::overrides::{BaselineEntry, ResolvedOverride, SecondaryMatch, WILDCARD};

/// Layer `overrides` on top of `baseline`, returning a new list in baseline order.
///
/// For each entry the last matching override wins. A `*` value keeps the baseline value.
/// The inputs are never modified; every returned entry is a fresh copy.
pub fn apply_overrides(
    baseline: &[BaselineEntry],
    overrides: &[ResolvedOverride],
) -> Vec<BaselineEntry> {
    baseline
        .iter()
        .map(|entry| {
            let mut result = entry.clone();
            match overrides.iter().rev().find(|o| o.matches(entry)) {
                Some(override_) if override_.value != WILDCARD => {
                    result.value = override_.value.clone();
                }
                _ => {}
            }
            result
        })
        .collect()
}

/// Replace step-wide overrides (a step name with any secondary) with one override per resource
/// of that step, so they can be written as `Step:Resource:Value` strings.
///
/// A `*` value becomes each resource's baseline value. Other overrides are copied unchanged.
pub fn expand_secondary_wildcards(
    baseline: &[BaselineEntry],
    overrides: &[ResolvedOverride],
) -> Vec<ResolvedOverride> {
    let mut expanded = Vec::with_capacity(overrides.len());

    for override_ in overrides {
        let step_wide = override_.action_name.is_some()
            && override_.resource_id.is_none()
            && override_.secondary == SecondaryMatch::Any;
        if !step_wide {
            expanded.push(override_.clone());
            continue;
        }

        expanded.extend(
            baseline
                .iter()
                .filter(|entry| override_.matches(entry))
                .map(|entry| ResolvedOverride {
                    action_name: Some(entry.action_name.clone()),
                    resource_id: None,
                    secondary: SecondaryMatch::Exact(entry.secondary.clone()),
                    value: if override_.value == WILDCARD {
                        entry.value.clone()
                    } else {
                        override_.value.clone()
                    },
                }),
        );
    }

    expanded
}
