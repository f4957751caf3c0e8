//! Pluggable suffix list sources and cache stores.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{DomainError, Result};

/// Default timeout for a whole suffix list download
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the downloaded list size
const MAX_LIST_SIZE: u64 = 16 * 1024 * 1024;

/// Trait for fetching raw suffix list text
pub trait SuffixSource: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

impl<T: SuffixSource + ?Sized> SuffixSource for Arc<T> {
    fn fetch_text(&self, url: &str) -> Result<String> {
        (**self).fetch_text(url)
    }
}

/// HTTP(S) source
pub struct HttpSource {
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Bound the whole request (connect, headers and body)
    pub fn with_timeout(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SuffixSource for HttpSource {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| DomainError::Connect(format!("Download failed: {}", e)))?;

        response
            .body_mut()
            .with_config()
            .limit(MAX_LIST_SIZE)
            .read_to_string()
            .map_err(|e| DomainError::Connect(format!("Failed to read response body: {}", e)))
    }
}

/// In-memory source returning fixed text; counts fetches
pub struct StaticSource {
    text: String,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of times `fetch_text` was called
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SuffixSource for StaticSource {
    fn fetch_text(&self, _url: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Nil source - every fetch fails
pub struct NilSource;

impl SuffixSource for NilSource {
    fn fetch_text(&self, url: &str) -> Result<String> {
        Err(DomainError::Connect(format!(
            "Suffix list not available (requested: {})",
            url
        )))
    }
}

/// Trait for persisting cache records
pub trait CacheStore: Send + Sync {
    /// Read the record bytes; `Ok(None)` when nothing is stored
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).write(path, bytes)
    }
}

/// File system store; writes go to a temporary file that is renamed into place
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCacheStore;

impl CacheStore for FileCacheStore {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        if let Err(e) = file.write_all(bytes).and_then(|_| file.flush()) {
            drop(file);
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        drop(file);

        fs::rename(&tmp_path, path)
    }
}

/// In-memory store for testing
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<PathBuf, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.entries.lock().insert(path.into(), bytes);
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.entries.lock().get(path).cloned()
    }
}

impl CacheStore for MemoryCacheStore {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        Ok(self.get(path))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cache store is read-only",
            ));
        }
        self.insert(path, bytes.to_vec());
        Ok(())
    }
}
