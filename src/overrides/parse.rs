use crate::overrides::{AmbiguousOverride, OverrideError, OverrideKind, WILDCARD, split::split};

/// Parse an override string into an ambiguous override.
///
/// Accepted forms are `primary:value` and `primary:secondary:value`. A `*` primary is treated as
/// unspecified for kinds that allow wildcard primaries. A `*` secondary is compacted to an empty
/// one only for kinds where an empty secondary already means "any"; other kinds keep the `*`
/// so it can still be told apart from the step's primary resource.
pub fn parse_override<K: OverrideKind>(kind: &K, raw: &str) -> Result<AmbiguousOverride, OverrideError> {
    let noun = kind.noun();

    if raw.trim().is_empty() {
        return Err(OverrideError::InvalidFormat(format!("empty {noun} specification")));
    }

    let (primary, secondary, value) = match split(raw, kind.delimiters(raw)).as_slice() {
        [primary, value] => (primary.trim(), "", value.trim()),
        [primary, secondary, value] => (primary.trim(), secondary.trim(), value.trim()),
        _ => {
            return Err(OverrideError::InvalidFormat(format!(
                "{noun} specification \"{raw}\" does not use expected format"
            )));
        }
    };

    if primary.is_empty() && !kind.allows_wildcard_primary() {
        return Err(OverrideError::InvalidFormat(format!(
            "{noun} specification \"{raw}\" cannot have an empty step name"
        )));
    }

    if value.is_empty() {
        return Err(OverrideError::InvalidFormat(format!(
            "{noun} specification \"{raw}\" cannot have an empty {}",
            kind.value_noun()
        )));
    }

    kind.validate_value(value)?;

    let primary = if primary == WILDCARD && kind.allows_wildcard_primary() {
        ""
    } else {
        primary
    };
    let secondary = if secondary == WILDCARD && kind.empty_secondary_is_wildcard() {
        ""
    } else {
        secondary
    };

    Ok(AmbiguousOverride {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        value: value.to_string(),
    })
}
