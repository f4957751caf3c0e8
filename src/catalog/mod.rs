//! Public suffix catalog: in-memory representation, persisted record and the
//! build pipeline (parse → merge → sort → stamp).

pub mod list;
pub mod loader;
pub mod source;
pub mod supplementary;

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::idn::IdnCodec;

pub use list::{extract_icann_block, group_key, parse_suffix_list, BEGIN_MARKER, END_MARKER};
pub use loader::{
    CatalogLoader, CatalogOrigin, LoadedCatalog, LoaderOptions, DEFAULT_CACHE_FILENAME,
    DEFAULT_CACHE_TTL, DEFAULT_RETRY_INTERVAL, DEFAULT_SOURCE_URL,
};
pub use source::{
    CacheStore, FileCacheStore, HttpSource, MemoryCacheStore, NilSource, StaticSource,
    SuffixSource, DEFAULT_FETCH_TIMEOUT,
};
pub use supplementary::{SupplementaryList, SUPPLEMENTARY_LAST_MODIFIED};

/// Group name → suffix patterns
pub type SuffixGroups = BTreeMap<String, Vec<String>>;

/// Immutable set of suffix groups used for matching.
///
/// Patterns inside every group are ordered longest first so that a linear
/// scan finds the most specific suffix before any shorter one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixCatalog {
    groups: SuffixGroups,
    built_at: SystemTime,
}

impl SuffixCatalog {
    /// Create a catalog, ordering every group longest first
    pub fn new(mut groups: SuffixGroups, built_at: SystemTime) -> Self {
        sort_groups(&mut groups);
        Self { groups, built_at }
    }

    /// Restore a catalog from its persisted record
    pub fn from_record(record: CacheRecord) -> Self {
        let built_at = from_unix_seconds(record.timestamp);
        Self::new(record.groups, built_at)
    }

    /// Persisted form of this catalog
    pub fn to_record(&self) -> CacheRecord {
        CacheRecord {
            timestamp: unix_seconds(self.built_at),
            groups: self.groups.clone(),
        }
    }

    pub fn groups(&self) -> &SuffixGroups {
        &self.groups
    }

    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    /// Patterns of a single group
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Iterate groups in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, patterns)| (name.as_str(), patterns.as_slice()))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of patterns across all groups
    pub fn pattern_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Build a new catalog with `custom` groups laid over this one.
    ///
    /// Each custom group first drops the `replaced` patterns of the same
    /// name, then its own patterns are appended. `self` is left untouched;
    /// the returned value keeps the build time.
    pub fn overlaid_with(
        &self,
        custom: &SuffixGroups,
        replaced: &SuffixGroups,
        codec: &dyn IdnCodec,
    ) -> Self {
        let replaced = encode_groups(replaced, codec);
        let mut groups = self.groups.clone();

        for (name, patterns) in encode_groups(custom, codec) {
            let group = groups.entry(name.clone()).or_default();
            if let Some(dropped) = replaced.get(&name) {
                group.retain(|p| !dropped.contains(p));
            }
            for pattern in patterns {
                if !group.contains(&pattern) {
                    group.push(pattern);
                }
            }
        }

        Self::new(groups, self.built_at)
    }
}

/// On-disk representation of a [`SuffixCatalog`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Build time, seconds since the Unix epoch
    pub timestamp: u64,
    pub groups: SuffixGroups,
}

impl CacheRecord {
    /// A record is stale once it outlived `ttl` or predates the
    /// supplementary list it was built with.
    pub fn is_stale(&self, now: SystemTime, ttl: Duration, supplementary_modified: u64) -> bool {
        let age = unix_seconds(now).saturating_sub(self.timestamp);
        age > ttl.as_secs() || self.timestamp < supplementary_modified
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Run the full build pipeline on raw suffix list text.
///
/// `supplementary` entries are appended to the fetched groups before the
/// groups are ordered.
pub fn build_catalog(
    raw: &str,
    supplementary: &SuffixGroups,
    codec: &dyn IdnCodec,
    now: SystemTime,
) -> Result<SuffixCatalog> {
    let mut groups = parse_suffix_list(raw, codec)?;
    merge_groups(&mut groups, encode_groups(supplementary, codec));
    Ok(SuffixCatalog::new(groups, now))
}

/// Append `extra` into `target`, skipping patterns already present in a group.
pub fn merge_groups(target: &mut SuffixGroups, extra: SuffixGroups) {
    for (name, patterns) in extra {
        let group = target.entry(name).or_default();
        for pattern in patterns {
            if !group.contains(&pattern) {
                group.push(pattern);
            }
        }
    }
}

/// Order every group by descending pattern length; ties keep their order.
pub fn sort_groups(groups: &mut SuffixGroups) {
    for patterns in groups.values_mut() {
        patterns.sort_by(|a, b| b.len().cmp(&a.len()));
    }
}

/// Lowercase and IDN-encode group names and patterns
fn encode_groups(groups: &SuffixGroups, codec: &dyn IdnCodec) -> SuffixGroups {
    groups
        .iter()
        .map(|(name, patterns)| {
            let patterns = patterns
                .iter()
                .map(|p| codec.encode(&p.trim().to_lowercase()))
                .filter(|p| !p.is_empty())
                .collect();
            (codec.encode(&name.trim().to_lowercase()), patterns)
        })
        .collect()
}

pub(crate) fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub(crate) fn from_unix_seconds(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}
