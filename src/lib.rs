//! Domain Parser - split host names into registrable label and public suffix
//!
//! This library provides:
//! - Public Suffix List download with an on-disk cache and TTL
//! - A built-in supplementary list of private and third-level suffixes
//! - Longest-match suffix resolution
//! - IDNA 2008 conversion between Unicode and ASCII-compatible forms
//! - Host name validity checks
//!
//! # Example
//!
//! ```rust
//! use domain_parser::{CatalogLoader, DomainParser, LoaderOptions};
//! use domain_parser::catalog::{MemoryCacheStore, StaticSource};
//!
//! let list = "
//! // ===BEGIN ICANN DOMAINS===
//! com
//! uk
//! co.uk
//! // ===END ICANN DOMAINS===
//! ";
//!
//! let loader = CatalogLoader::new(LoaderOptions::default())
//!     .with_source(StaticSource::new(list))
//!     .with_store(MemoryCacheStore::new());
//! let parser = DomainParser::new(loader);
//!
//! let result = parser.parse("https://www.example.co.uk/index.html", "com").unwrap();
//! assert_eq!(result.domain, "example");
//! assert_eq!(result.suffix, "co.uk");
//! assert_eq!(result.suffix_group, "uk");
//! assert!(result.valid_hostname);
//! ```
//!
//! # Resolution rules
//!
//! | Input | Domain | Suffix | Valid |
//! |-------|--------|--------|-------|
//! | `www.example.co.uk` | `example` | `co.uk` | yes |
//! | `justaword` | `justaword` | default suffix | yes |
//! | `my_site.com` | `my_site` | `com` | no |
//! | `co.uk` | empty | `co.uk` | no |
//!
//! Everything left of the suffix except the rightmost label is dropped, so
//! `www.example.co.uk` yields `example` rather than `www.example`. Names under
//! `name` are the exception and keep their full third-level label.

pub mod catalog;
pub mod error;
pub mod idn;
pub mod matcher;
pub mod parser;
pub mod types;

// Re-export commonly used items
pub use catalog::{
    CacheRecord, CatalogLoader, CatalogOrigin, LoadedCatalog, LoaderOptions, SuffixCatalog,
    SuffixGroups, SupplementaryList, DEFAULT_CACHE_TTL, DEFAULT_SOURCE_URL,
};
pub use error::{DomainError, ErrorKind, Result};
pub use idn::{IdnCodec, Idna2008Codec};
pub use matcher::{match_suffix, THIRD_LEVEL_SUFFIX};
pub use parser::{
    DomainParser, ErrorMode, ParserOptions, DEFAULT_CACHE_SIZE, DEFAULT_SUFFIX, MAX_LABEL_LENGTH,
};
pub use types::{MatchResult, ParseResult};
