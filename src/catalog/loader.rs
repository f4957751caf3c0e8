use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::{Mutex, RwLock};

use crate::error::{DomainError, Result};
use crate::idn::{IdnCodec, Idna2008Codec};

use super::source::{CacheStore, FileCacheStore, HttpSource, SuffixSource};
use super::supplementary::SupplementaryList;
use super::{build_catalog, CacheRecord, SuffixCatalog, SuffixGroups};

/// Logger callback type for logging catalog updates
type LoggerCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Default cache lifetime: 5 days
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(432_000);

/// How long a stale catalog is served after a failed refresh before retrying
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_SOURCE_URL: &str = "https://publicsuffix.org/list/public_suffix_list.dat";

/// Cache file name inside the system temp directory
pub const DEFAULT_CACHE_FILENAME: &str = "domainparsertld.json";

/// Catalog loader configuration
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub cache_path: Option<PathBuf>,
    pub source_url: String,
    pub cache_ttl: Duration,
    pub retry_interval: Duration,
    pub force_reload: bool,
    pub custom_groups: SuffixGroups,
    pub supplementary: SupplementaryList,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            cache_path: None,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            force_reload: false,
            custom_groups: SuffixGroups::new(),
            supplementary: SupplementaryList::builtin(),
        }
    }
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache file path
    pub fn with_cache_path(mut self, path: impl AsRef<Path>) -> Self {
        self.cache_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set suffix list URL
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Set cache lifetime
    /// Default is 5 days (DEFAULT_CACHE_TTL)
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set how long a stale catalog is kept after a failed refresh
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Rebuild the catalog on the next load regardless of cache age
    pub fn with_force_reload(mut self, force: bool) -> Self {
        self.force_reload = force;
        self
    }

    /// Replace all custom suffix groups
    pub fn with_custom_groups(mut self, groups: SuffixGroups) -> Self {
        self.custom_groups = groups;
        self
    }

    /// Add a custom suffix group; it replaces the supplementary entries of
    /// the same-named group and is never written to the cache file
    pub fn add_custom_group<I, S>(mut self, name: impl Into<String>, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_groups
            .insert(name.into(), suffixes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the supplementary list merged into every rebuilt catalog
    pub fn with_supplementary(mut self, supplementary: SupplementaryList) -> Self {
        self.supplementary = supplementary;
        self
    }

    /// Effective cache file path
    pub fn resolved_cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_CACHE_FILENAME))
    }
}

/// Where a loaded catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    /// Already published in this process
    Memory,
    /// Fresh on-disk record
    Cache,
    /// Downloaded and rebuilt
    Fetched,
    /// Outdated on-disk record kept because the download failed
    StaleCache,
}

/// A ready catalog plus what happened while producing it
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Arc<SuffixCatalog>,
    pub origin: CatalogOrigin,
    /// Set when a freshly built catalog could not be written to the cache
    pub persist_error: Option<DomainError>,
}

struct Published {
    catalog: Arc<SuffixCatalog>,
    origin: CatalogOrigin,
    expires_at: SystemTime,
}

/// Loads, refreshes and publishes the suffix catalog.
///
/// The published catalog is swapped as a whole; readers holding an
/// `Arc<SuffixCatalog>` never observe a partially rebuilt catalog.
pub struct CatalogLoader {
    options: LoaderOptions,
    source: Box<dyn SuffixSource>,
    store: Box<dyn CacheStore>,
    codec: Arc<dyn IdnCodec>,
    logger: Option<LoggerCallback>,
    current: RwLock<Option<Published>>,
    force_reload: AtomicBool,
    refresh_lock: Mutex<()>,
}

impl CatalogLoader {
    /// Create a loader using HTTP download, a cache file and IDNA 2008
    pub fn new(options: LoaderOptions) -> Self {
        let force_reload = AtomicBool::new(options.force_reload);
        Self {
            options,
            source: Box::new(HttpSource::new()),
            store: Box::new(FileCacheStore),
            codec: Arc::new(Idna2008Codec),
            logger: None,
            current: RwLock::new(None),
            force_reload,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Set suffix list source
    pub fn with_source(mut self, source: impl SuffixSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Set cache store
    pub fn with_store(mut self, store: impl CacheStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Set IDN codec
    pub fn with_codec(mut self, codec: Arc<dyn IdnCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Set logger
    pub fn with_logger<F>(mut self, logger: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.logger = Some(Box::new(logger));
        self
    }

    fn log(&self, msg: &str) {
        log::debug!("{}", msg);
        if let Some(ref logger) = self.logger {
            logger(msg);
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn codec(&self) -> Arc<dyn IdnCodec> {
        Arc::clone(&self.codec)
    }

    /// Currently published catalog, if any
    pub fn current(&self) -> Option<Arc<SuffixCatalog>> {
        self.current
            .read()
            .as_ref()
            .map(|published| Arc::clone(&published.catalog))
    }

    /// Rebuild the catalog on the next `ensure_loaded` call.
    ///
    /// The request stays pending until a fetch succeeds; while a stale
    /// fallback is published, attempts are spaced by the retry interval.
    pub fn reload(&self) {
        self.force_reload.store(true, Ordering::Release);
    }

    /// Return a ready catalog, loading or refreshing it when needed.
    pub fn ensure_loaded(&self) -> Result<LoadedCatalog> {
        // Fast path: published and not expired
        if let Some(loaded) = self.published_if_fresh(SystemTime::now()) {
            return Ok(loaded);
        }

        let _lock = self.refresh_lock.lock();

        // Double-check: another thread may have refreshed meanwhile
        let now = SystemTime::now();
        if let Some(loaded) = self.published_if_fresh(now) {
            return Ok(loaded);
        }

        let forced = self.force_reload.load(Ordering::Acquire);
        let path = self.options.resolved_cache_path();
        let record = self.read_record(&path);

        if let Some(ref record) = record {
            let stale = record.is_stale(
                now,
                self.options.cache_ttl,
                self.options.supplementary.last_modified(),
            );
            if !stale && !forced {
                self.log(&format!("Using cached suffix list {}", path.display()));
                let catalog = self.with_custom_groups(SuffixCatalog::from_record(record.clone()));
                let expires_at = catalog.built_at() + self.options.cache_ttl;
                return Ok(self.publish(catalog, CatalogOrigin::Cache, None, expires_at));
            }
            self.log(&format!(
                "Cached suffix list {} needs refresh (forced: {})",
                path.display(),
                forced
            ));
        }

        self.refresh(&path, record, now)
    }

    fn published_if_fresh(&self, now: SystemTime) -> Option<LoadedCatalog> {
        let forced = self.force_reload.load(Ordering::Acquire);

        let guard = self.current.read();
        let published = guard.as_ref()?;

        // A forced reload that fell back to the stale cache waits for the
        // retry time like any other failed refresh
        if forced && published.origin != CatalogOrigin::StaleCache {
            return None;
        }
        if now >= published.expires_at {
            return None;
        }

        Some(LoadedCatalog {
            catalog: Arc::clone(&published.catalog),
            origin: CatalogOrigin::Memory,
            persist_error: None,
        })
    }

    /// Fetch, rebuild and persist; fall back to `prior` if the fetch fails
    fn refresh(
        &self,
        path: &Path,
        prior: Option<CacheRecord>,
        now: SystemTime,
    ) -> Result<LoadedCatalog> {
        let url = &self.options.source_url;
        self.log(&format!("Downloading suffix list from {}", url));

        let text = match self.source.fetch_text(url) {
            Ok(text) => text,
            Err(e) => {
                let Some(record) = prior else {
                    return Err(DomainError::Connect(format!(
                        "Could not fetch suffix list from {}: {}",
                        url, e
                    )));
                };
                log::warn!("Suffix list download failed, using existing cache: {}", e);
                self.log(&format!("Download failed, using existing cache: {}", e));

                let catalog = self.with_custom_groups(SuffixCatalog::from_record(record));
                let expires_at = now + self.options.retry_interval;
                return Ok(self.publish(catalog, CatalogOrigin::StaleCache, None, expires_at));
            }
        };

        let catalog = build_catalog(
            &text,
            self.options.supplementary.groups(),
            self.codec.as_ref(),
            now,
        )?;

        self.log(&format!(
            "Built suffix catalog: {} groups, {} suffixes",
            catalog.len(),
            catalog.pattern_count()
        ));

        let persist_error = self.persist(path, &catalog).err();
        if let Some(ref e) = persist_error {
            log::warn!("{}", e);
        }

        self.force_reload.store(false, Ordering::Release);
        let catalog = self.with_custom_groups(catalog);
        let expires_at = now + self.options.cache_ttl;
        Ok(self.publish(catalog, CatalogOrigin::Fetched, persist_error, expires_at))
    }

    /// Read and decode the cache record; unreadable records count as absent
    fn read_record(&self, path: &Path) -> Option<CacheRecord> {
        let bytes = match self.store.read(path) {
            Ok(bytes) => bytes?,
            Err(e) => {
                log::warn!("Could not read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match CacheRecord::from_bytes(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn persist(&self, path: &Path, catalog: &SuffixCatalog) -> Result<()> {
        let bytes = catalog.to_record().to_bytes()?;
        self.store
            .write(path, &bytes)
            .map_err(|e| DomainError::Persist {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        self.log(&format!("Wrote suffix cache {}", path.display()));
        Ok(())
    }

    /// Custom groups on top of a built or restored catalog
    fn with_custom_groups(&self, catalog: SuffixCatalog) -> SuffixCatalog {
        if self.options.custom_groups.is_empty() {
            return catalog;
        }
        catalog.overlaid_with(
            &self.options.custom_groups,
            self.options.supplementary.groups(),
            self.codec.as_ref(),
        )
    }

    fn publish(
        &self,
        catalog: SuffixCatalog,
        origin: CatalogOrigin,
        persist_error: Option<DomainError>,
        expires_at: SystemTime,
    ) -> LoadedCatalog {
        let catalog = Arc::new(catalog);
        *self.current.write() = Some(Published {
            catalog: Arc::clone(&catalog),
            origin,
            expires_at,
        });

        LoadedCatalog {
            catalog,
            origin,
            persist_error,
        }
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}
