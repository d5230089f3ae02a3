use crate::overrides::{
    AmbiguousOverride, BaselineEntry, OverrideError, OverrideKind, ResolvedOverride,
    SecondaryMatch, WILDCARD,
};

struct Match<'a> {
    score: u32,
    entry: &'a BaselineEntry,
    action_name: Option<String>,
    resource_id: Option<String>,
    secondary: Option<String>,
}

/// Match an ambiguous override against the baseline and work out what its primary refers to.
///
/// The primary may be a step name or a resource id; candidates are scored with
/// [`OverrideKind::match_weights`] in this order: step + secondary, resource + secondary,
/// secondary only, step only, resource only. The first entry with the highest score wins.
/// A `*` value is replaced with the matched entry's baseline value.
///
/// A `*` secondary (only left in place by kinds where an empty secondary names the primary
/// resource) matches every resource of the step, and the result applies to all of them. A `*`
/// value is kept as is in that case so each resource falls back to its own baseline value.
pub fn resolve_override<K: OverrideKind>(
    kind: &K,
    override_: &AmbiguousOverride,
    baseline: &[BaselineEntry],
) -> Result<ResolvedOverride, OverrideError> {
    // wildcards match everything, no need to look at the baseline
    if override_.primary.is_empty() && override_.secondary.is_empty() {
        return Ok(ResolvedOverride::universal(override_.value.clone()));
    }

    let weights = kind.match_weights();
    let primary = override_.primary.as_str();
    let secondary = override_.secondary.as_str();
    let any_secondary = secondary == WILDCARD;

    let mut best: Option<Match> = None;
    for entry in baseline {
        let same_secondary = any_secondary || entry.secondary == secondary;

        let candidate = if !entry.action_name.is_empty() && entry.action_name == primary {
            if same_secondary {
                weights.step_and_secondary.map(|score| Match {
                    score,
                    entry,
                    action_name: Some(entry.action_name.clone()),
                    resource_id: None,
                    secondary: Some(entry.secondary.clone()),
                })
            } else {
                weights.step_only.map(|score| Match {
                    score,
                    entry,
                    action_name: Some(entry.action_name.clone()),
                    resource_id: None,
                    secondary: None,
                })
            }
        } else if entry
            .resource_id
            .as_deref()
            .is_some_and(|id| !id.is_empty() && id == primary)
        {
            if same_secondary {
                weights.resource_and_secondary.map(|score| Match {
                    score,
                    entry,
                    action_name: None,
                    resource_id: entry.resource_id.clone(),
                    secondary: Some(entry.secondary.clone()),
                })
            } else {
                weights.resource_only.map(|score| Match {
                    score,
                    entry,
                    action_name: None,
                    resource_id: entry.resource_id.clone(),
                    secondary: None,
                })
            }
        } else if !any_secondary && !entry.secondary.is_empty() && same_secondary {
            weights.secondary_only.map(|score| Match {
                score,
                entry,
                action_name: None,
                resource_id: None,
                secondary: Some(entry.secondary.clone()),
            })
        } else {
            None
        };

        if let Some(candidate) = candidate {
            if best.as_ref().is_none_or(|best| candidate.score > best.score) {
                best = Some(candidate);
            }
        }
    }

    let Some(best) = best else {
        return Err(OverrideError::Unresolvable {
            primary_noun: kind.primary_noun(),
            primary: override_.primary.clone(),
            secondary_noun: kind.secondary_noun(),
            secondary: override_.secondary.clone(),
        });
    };

    let value = if override_.value == WILDCARD && !any_secondary {
        best.entry.value.clone()
    } else {
        override_.value.clone()
    };

    let secondary = match best.secondary {
        _ if any_secondary => SecondaryMatch::Any,
        Some(secondary) if secondary.is_empty() && kind.empty_secondary_is_wildcard() => {
            SecondaryMatch::Any
        }
        Some(secondary) => SecondaryMatch::Exact(secondary),
        None => SecondaryMatch::Any,
    };

    Ok(ResolvedOverride {
        action_name: best.action_name,
        resource_id: best.resource_id,
        secondary,
        value,
    })
}
