//! Built-in suffixes missing from the ICANN section of the Public Suffix
//! List: popular private registrations and third-level zones.

use super::SuffixGroups;

/// Last edit of [`BUILTIN_SUFFIXES`], seconds since the Unix epoch.
///
/// Bump whenever the table changes so cached catalogs are rebuilt.
pub const SUPPLEMENTARY_LAST_MODIFIED: u64 = 1_717_200_000;

const BUILTIN_SUFFIXES: &[(&str, &[&str])] = &[
    ("app", &["web.app"]),
    (
        "com",
        &[
            "appspot.com",
            "blogspot.com",
            "br.com",
            "cn.com",
            "de.com",
            "eu.com",
            "gb.com",
            "herokuapp.com",
            "jpn.com",
            "qc.com",
            "ru.com",
            "sa.com",
            "uk.com",
            "us.com",
            "za.com",
        ],
    ),
    ("de", &["com.de"]),
    ("dev", &["pages.dev", "workers.dev"]),
    ("eu", &["co.eu"]),
    ("io", &["github.io", "gitlab.io"]),
    (
        "net",
        &[
            "azurewebsites.net",
            "cloudfront.net",
            "gb.net",
            "hu.net",
            "jp.net",
            "se.net",
            "uk.net",
        ],
    ),
    ("org", &["ae.org", "us.org"]),
];

/// Versioned supplementary suffix table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementaryList {
    groups: SuffixGroups,
    last_modified: u64,
}

impl SupplementaryList {
    /// The table bundled with this crate
    pub fn builtin() -> Self {
        let groups = BUILTIN_SUFFIXES
            .iter()
            .map(|(name, suffixes)| {
                (
                    name.to_string(),
                    suffixes.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();

        Self::new(groups, SUPPLEMENTARY_LAST_MODIFIED)
    }

    pub fn new(groups: SuffixGroups, last_modified: u64) -> Self {
        Self {
            groups,
            last_modified,
        }
    }

    /// No supplementary entries
    pub fn empty() -> Self {
        Self::new(SuffixGroups::new(), 0)
    }

    pub fn groups(&self) -> &SuffixGroups {
        &self.groups
    }

    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }
}

impl Default for SupplementaryList {
    fn default() -> Self {
        Self::builtin()
    }
}
