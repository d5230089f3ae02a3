//! Tokenizer for override strings.

/// Split `input` on any of the `delimiters`, keeping empty components.
///
/// Input with `k` delimiter characters always yields `k + 1` components, so `"::5"` becomes
/// `["", "", "5"]` and a leading delimiter shows up as an empty first component.
/// Components are not trimmed.
pub fn split<'a>(input: &'a str, delimiters: &[char]) -> Vec<&'a str> {
    input.split(|c: char| delimiters.contains(&c)).collect()
}
