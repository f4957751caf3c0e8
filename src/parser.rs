use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::catalog::{CatalogLoader, LoadedCatalog, LoaderOptions, SuffixCatalog};
use crate::error::{DomainError, Result};
use crate::idn::IdnCodec;
use crate::matcher::match_suffix;
use crate::types::ParseResult;

/// Leading scheme and the host part up to the first slash
static HOST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:http|https|ftp|ftps|news|ssh|sftp|gopher):/{2,})?([^/]+)")
        .expect("HOST_PATTERN: hardcoded regex is invalid")
});

/// Suffix used when the input has no recognizable suffix
pub const DEFAULT_SUFFIX: &str = "com";

/// Longest allowed registrable label, in ASCII form
pub const MAX_LABEL_LENGTH: usize = 63;

/// Default LRU cache size for parse results
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// How parse failures are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Failures are returned as `Err`
    #[default]
    Strict,
    /// Failures are returned as an empty `ParseResult` with `error` set
    Trapped,
}

/// Parser options.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub error_mode: ErrorMode,
    /// LRU cache size for parse results; 0 disables caching
    pub cache_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Set cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}

type CacheKey = (String, String);

/// Parse results computed against one published catalog
struct ResultCache {
    catalog: Option<Arc<SuffixCatalog>>,
    entries: LruCache<CacheKey, ParseResult>,
}

impl ResultCache {
    fn new(size: NonZeroUsize) -> Self {
        Self {
            catalog: None,
            entries: LruCache::new(size),
        }
    }

    /// Drop entries computed against a different catalog
    fn sync(&mut self, catalog: &Arc<SuffixCatalog>) {
        let current = self
            .catalog
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, catalog));
        if !current {
            self.entries.clear();
            self.catalog = Some(Arc::clone(catalog));
        }
    }
}

/// Splits host names into registrable label and public suffix.
///
/// # Example
///
/// ```no_run
/// use domain_parser::DomainParser;
///
/// let parser = DomainParser::default();
/// let result = parser.parse("https://www.example.co.uk/path", "com").unwrap();
/// assert_eq!(result.domain, "example");
/// assert_eq!(result.suffix, "co.uk");
/// ```
pub struct DomainParser {
    loader: CatalogLoader,
    codec: Arc<dyn IdnCodec>,
    options: ParserOptions,
    cache: Option<Mutex<ResultCache>>,
}

impl DomainParser {
    /// Create a parser with default options.
    pub fn new(loader: CatalogLoader) -> Self {
        Self::with_options(loader, ParserOptions::default())
    }

    /// Create a parser with custom options.
    pub fn with_options(loader: CatalogLoader, options: ParserOptions) -> Self {
        let cache = NonZeroUsize::new(options.cache_size)
            .map(|size| Mutex::new(ResultCache::new(size)));
        Self {
            codec: loader.codec(),
            loader,
            options,
            cache,
        }
    }

    pub fn loader(&self) -> &CatalogLoader {
        &self.loader
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Load or refresh the suffix catalog without parsing anything.
    pub fn ensure_loaded(&self) -> Result<LoadedCatalog> {
        self.loader.ensure_loaded()
    }

    /// Parse `input`, using `default_suffix` when no known suffix matches.
    pub fn parse(&self, input: &str, default_suffix: &str) -> Result<ParseResult> {
        match self.try_parse(input, default_suffix) {
            Ok(result) => Ok(result),
            Err(e) => match self.options.error_mode {
                ErrorMode::Strict => Err(e),
                ErrorMode::Trapped => {
                    log::debug!("Trapped parse error for {:?}: {}", input, e);
                    Ok(ParseResult::from_error(e.to_string()))
                }
            },
        }
    }

    /// Parse with [`DEFAULT_SUFFIX`].
    pub fn parse_default(&self, input: &str) -> Result<ParseResult> {
        self.parse(input, DEFAULT_SUFFIX)
    }

    /// Whether `input` is a valid host name; no default suffix is applied.
    pub fn is_valid(&self, input: &str) -> Result<bool> {
        Ok(self.parse(input, "")?.valid_hostname)
    }

    /// Clear the parse result cache
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.lock().entries.clear();
        }
    }

    fn try_parse(&self, input: &str, default_suffix: &str) -> Result<ParseResult> {
        let candidate = normalize(input);
        if candidate.is_empty() {
            return Err(DomainError::UnparsableInput(format!(
                "no host name in {:?}",
                input
            )));
        }

        let loaded = self.loader.ensure_loaded()?;
        if let Some(e) = loaded.persist_error {
            return Err(e);
        }

        let Some(ref cache) = self.cache else {
            return resolve(&candidate, &loaded.catalog, self.codec.as_ref(), default_suffix);
        };

        let key = (candidate, default_suffix.to_string());
        {
            let mut cache = cache.lock();
            cache.sync(&loaded.catalog);
            if let Some(result) = cache.entries.get(&key) {
                return Ok(result.clone());
            }
        }

        let result = resolve(&key.0, &loaded.catalog, self.codec.as_ref(), default_suffix)?;

        let mut cache = cache.lock();
        cache.sync(&loaded.catalog);
        cache.entries.put(key, result.clone());
        Ok(result)
    }
}

impl Default for DomainParser {
    fn default() -> Self {
        Self::new(CatalogLoader::new(LoaderOptions::default()))
    }
}

#[cfg(feature = "async")]
impl DomainParser {
    /// Parse on tokio's blocking pool; catalog refreshes do blocking I/O.
    pub async fn parse_async(
        self: &Arc<Self>,
        input: impl Into<String>,
        default_suffix: impl Into<String>,
    ) -> Result<ParseResult> {
        let parser = Arc::clone(self);
        let input = input.into();
        let default_suffix = default_suffix.into();

        tokio::task::spawn_blocking(move || parser.parse(&input, &default_suffix))
            .await
            .map_err(|e| DomainError::IoError(std::io::Error::other(e)))?
    }
}

/// Lowercase, drop a known scheme and everything from the first path slash.
pub fn normalize(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    HOST_PATTERN
        .captures(&lowered)
        .and_then(|captures| captures.get(1))
        .map(|host| host.as_str().to_string())
        .unwrap_or_default()
}

/// Classify a normalized candidate against `catalog`.
pub fn resolve(
    candidate: &str,
    catalog: &SuffixCatalog,
    codec: &dyn IdnCodec,
    default_suffix: &str,
) -> Result<ParseResult> {
    let encoded = codec.encode(candidate);
    let matched = match_suffix(&encoded, catalog);

    let has_label = !matched.domain_label.is_empty();
    let has_suffix = !matched.suffix.is_empty();

    if !has_label && !has_suffix && encoded.len() <= MAX_LABEL_LENGTH {
        // Unknown suffix: the whole candidate is the label
        let default_suffix = default_suffix.trim().to_lowercase();
        return Ok(ParseResult::new(
            codec.decode(&encoded),
            encoded.clone(),
            default_suffix.clone(),
            codec.encode(&default_suffix),
            "",
            is_valid_label(&encoded),
        ));
    }

    if has_label && has_suffix && matched.domain_label.len() <= MAX_LABEL_LENGTH {
        return Ok(ParseResult::new(
            codec.decode(&matched.domain_label),
            matched.domain_label.clone(),
            codec.decode(&matched.suffix),
            matched.suffix,
            matched.group,
            is_valid_label(&matched.domain_label),
        ));
    }

    if !has_label && has_suffix {
        return Ok(ParseResult::new(
            "",
            "",
            codec.decode(&matched.suffix),
            matched.suffix,
            matched.group,
            false,
        ));
    }

    Err(DomainError::UnparsableInput(format!(
        "{:?} is not a domain name",
        candidate
    )))
}

/// Only ASCII letters, digits, hyphens and label-separating dots are allowed.
pub fn is_valid_label(label: &str) -> bool {
    label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
