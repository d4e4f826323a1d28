#![forbid(unsafe_code)]

//! Class-token addressing for row and cell nodes.
//!
//! Row nodes carry the class token `{row_prefix}{y}` and cell nodes carry
//! `{column_prefix}{x}`. Stylesheets and other renderers locate grid nodes by
//! these tokens, so they stay part of the external contract even though the
//! applier itself resolves nodes through its handle index.

/// Build the class token for index `index` under `prefix`.
#[must_use]
pub fn class_token(prefix: &str, index: u32) -> String {
    format!("{prefix}{index}")
}

/// Parse a canonical class token back into its index.
///
/// Only the exact decimal rendering matches: `row7` yields `Some(7)` but
/// `row07`, `row+7`, and `row` yield `None`, mirroring how a `.row7` class
/// selector would resolve.
#[must_use]
pub fn parse_class_token(prefix: &str, token: &str) -> Option<u32> {
    let digits = token.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Find the first canonical token for `prefix` among `classes`.
pub fn find_index<'a, I>(prefix: &str, classes: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    classes
        .into_iter()
        .find_map(|token| parse_class_token(prefix, token))
}
