use crate::catalog::SuffixCatalog;
use crate::types::MatchResult;

/// Suffix under which names are registered at the third level
/// (`john.smith.name`), so the label left of it is kept whole.
pub const THIRD_LEVEL_SUFFIX: &str = "name";

/// Find the best suffix for `candidate` in `catalog`.
///
/// `candidate` must already be lowercased and IDN-encoded. A pattern that
/// `candidate` ends with (preceded by a dot) wins immediately; since groups
/// are ordered longest first, that is the most specific suffix of the group.
/// A candidate equal to a pattern is a bare-suffix match and is returned only
/// when no label-bearing match exists anywhere in the catalog.
///
/// The registrable label is collapsed to the rightmost label left of the
/// suffix: `www.example.co.uk` yields `example`, not `www.example`.
pub fn match_suffix(candidate: &str, catalog: &SuffixCatalog) -> MatchResult {
    let mut bare: Option<MatchResult> = None;

    for (group, patterns) in catalog.iter() {
        for pattern in patterns {
            if let Some(prefix) = strip_dotted_suffix(candidate, pattern) {
                return MatchResult {
                    domain_label: registrable_label(prefix, pattern).to_string(),
                    suffix: pattern.clone(),
                    group: group.to_string(),
                };
            }

            if candidate == pattern {
                if bare.is_none() {
                    bare = Some(MatchResult {
                        domain_label: String::new(),
                        suffix: pattern.clone(),
                        group: group.to_string(),
                    });
                }
                // Remaining patterns of this group are shorter
                break;
            }
        }
    }

    bare.unwrap_or_default()
}

/// `candidate` without a trailing `.pattern`
fn strip_dotted_suffix<'a>(candidate: &'a str, pattern: &str) -> Option<&'a str> {
    candidate.strip_suffix(pattern)?.strip_suffix('.')
}

fn registrable_label<'a>(prefix: &'a str, suffix: &str) -> &'a str {
    let label = prefix.trim_matches('.');

    let label = if suffix == THIRD_LEVEL_SUFFIX {
        label
    } else {
        label.rsplit('.').next().unwrap_or(label)
    };

    label.rsplit(' ').next().unwrap_or(label)
}
