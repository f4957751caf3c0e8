use serde::{Deserialize, Serialize};

/// Outcome of matching a candidate against a suffix catalog.
///
/// All fields are empty when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Registrable label left of the suffix (ASCII form)
    pub domain_label: String,
    /// Matched suffix pattern (ASCII form)
    pub suffix: String,
    /// Catalog group the suffix was found in
    pub group: String,
}

impl MatchResult {
    /// True when no suffix matched
    pub fn is_empty(&self) -> bool {
        self.suffix.is_empty() && self.domain_label.is_empty()
    }
}

/// Parsed domain name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Fully qualified domain name (Unicode)
    pub fqdn: Option<String>,
    /// Fully qualified domain name (ASCII-compatible)
    pub idn_fqdn: Option<String>,
    /// Registrable label (Unicode)
    pub domain: String,
    /// Registrable label (ASCII-compatible)
    pub idn_domain: String,
    /// Public suffix (Unicode)
    pub suffix: String,
    /// Public suffix (ASCII-compatible)
    pub idn_suffix: String,
    /// Catalog group of the suffix
    pub suffix_group: String,
    /// Whether the label is a syntactically valid host name
    pub valid_hostname: bool,
    /// Error message, set only in trapped mode
    pub error: Option<String>,
}

impl ParseResult {
    pub fn new(
        domain: impl Into<String>,
        idn_domain: impl Into<String>,
        suffix: impl Into<String>,
        idn_suffix: impl Into<String>,
        suffix_group: impl Into<String>,
        valid_hostname: bool,
    ) -> Self {
        let domain = domain.into();
        let idn_domain = idn_domain.into();
        let suffix = suffix.into();
        let idn_suffix = idn_suffix.into();

        let fqdn = join_fqdn(&domain, &suffix);
        let idn_fqdn = join_fqdn(&idn_domain, &idn_suffix);

        Self {
            fqdn,
            idn_fqdn,
            domain,
            idn_domain,
            suffix,
            idn_suffix,
            suffix_group: suffix_group.into(),
            valid_hostname,
            error: None,
        }
    }

    /// Zero-valued result carrying an error message
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

fn join_fqdn(label: &str, suffix: &str) -> Option<String> {
    if label.is_empty() || suffix.is_empty() {
        None
    } else {
        Some(format!("{}.{}", label, suffix))
    }
}
