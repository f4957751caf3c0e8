//! Public Suffix List text format.
//!
//! Only the ICANN section of the list is used; private registrations are
//! covered by the supplementary list instead.

use crate::error::{DomainError, Result};
use crate::idn::IdnCodec;

use super::SuffixGroups;

pub const BEGIN_MARKER: &str = "// ===BEGIN ICANN DOMAINS===";
pub const END_MARKER: &str = "// ===END ICANN DOMAINS===";

/// Return the text between the ICANN begin and end markers.
pub fn extract_icann_block(text: &str) -> Result<&str> {
    let start = text
        .find(BEGIN_MARKER)
        .map(|pos| pos + BEGIN_MARKER.len())
        .ok_or_else(|| {
            DomainError::UnparsableCatalog("ICANN begin marker not found".to_string())
        })?;

    let len = text[start..].find(END_MARKER).ok_or_else(|| {
        DomainError::UnparsableCatalog("ICANN end marker not found".to_string())
    })?;

    Ok(&text[start..start + len])
}

/// Parse the ICANN section into encoded suffix groups (unsorted).
pub fn parse_suffix_list(text: &str, codec: &dyn IdnCodec) -> Result<SuffixGroups> {
    let block = extract_icann_block(text)?;
    let mut groups = SuffixGroups::new();

    for line in block.lines() {
        let line = line.trim();

        // Skip empty lines, comments and exception rules
        if line.is_empty() || line.starts_with("//") || line.contains('!') {
            continue;
        }

        let Some(suffix) = strip_wildcard(line) else {
            continue;
        };

        let encoded = codec.encode(&suffix.to_lowercase());
        if encoded.is_empty() {
            continue;
        }

        groups
            .entry(group_key(&encoded).to_string())
            .or_default()
            .push(encoded);
    }

    Ok(groups)
}

/// Top-level label of a suffix: text after the last dot, or the whole string.
pub fn group_key(suffix: &str) -> &str {
    match suffix.rfind('.') {
        Some(pos) => &suffix[pos + 1..],
        None => suffix,
    }
}

/// Reduce a wildcard rule (`*.kawasaki.jp`) to its concrete suffix.
///
/// A lone `*` has no concrete suffix and yields `None`.
fn strip_wildcard(line: &str) -> Option<&str> {
    if !line.starts_with('*') {
        return Some(line);
    }
    line.find('.')
        .map(|pos| &line[pos + 1..])
        .filter(|rest| !rest.is_empty())
}
