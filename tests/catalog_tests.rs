//! Integration tests for catalog building, caching and refresh.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use domain_parser::catalog::{
    build_catalog, CacheStore, FileCacheStore, MemoryCacheStore, NilSource, StaticSource,
};
use domain_parser::{
    CacheRecord, CatalogLoader, CatalogOrigin, DomainError, DomainParser, Idna2008Codec,
    LoaderOptions, SuffixGroups, SupplementaryList,
};

const SUFFIX_LIST: &str = "\
// ===BEGIN ICANN DOMAINS===
com
net
uk
co.uk
ltd.uk
*.sch.uk
jp
ac.jp
*.kawasaki.jp
// ===END ICANN DOMAINS===
";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("domain_parser_test_{}", name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn org_record(timestamp: u64) -> CacheRecord {
    let mut groups = SuffixGroups::new();
    groups.insert("org".to_string(), vec!["org".to_string()]);
    CacheRecord { timestamp, groups }
}

mod build_tests {
    use super::*;

    #[test]
    fn test_every_group_sorted_by_length() {
        let catalog = build_catalog(
            SUFFIX_LIST,
            SupplementaryList::builtin().groups(),
            &Idna2008Codec,
            SystemTime::now(),
        )
        .unwrap();

        for (group, patterns) in catalog.iter() {
            for pair in patterns.windows(2) {
                assert!(
                    pair[0].len() >= pair[1].len(),
                    "group {} not sorted: {:?}",
                    group,
                    patterns
                );
            }
        }
    }

    #[test]
    fn test_supplementary_appended_to_fetched_group() {
        let catalog = build_catalog(
            SUFFIX_LIST,
            SupplementaryList::builtin().groups(),
            &Idna2008Codec,
            SystemTime::now(),
        )
        .unwrap();

        let com = catalog.group("com").unwrap();
        assert!(com.contains(&"com".to_string()));
        assert!(com.contains(&"blogspot.com".to_string()));
        assert_eq!(com.last().map(String::as_str), Some("com"));
    }

    #[test]
    fn test_stable_order_for_equal_lengths() {
        let catalog = build_catalog(
            SUFFIX_LIST,
            &SuffixGroups::new(),
            &Idna2008Codec,
            SystemTime::now(),
        )
        .unwrap();

        // ltd.uk and sch.uk have equal length and keep list order
        assert_eq!(
            catalog.group("uk").unwrap(),
            &["ltd.uk", "sch.uk", "co.uk", "uk"]
        );
    }

    #[test]
    fn test_missing_markers_rejected() {
        let err = build_catalog(
            "com\nnet\n",
            &SuffixGroups::new(),
            &Idna2008Codec,
            SystemTime::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::UnparsableCatalog(_)));
    }
}

mod cache_file_tests {
    use super::*;

    #[test]
    fn test_cache_file_written_and_reused() {
        let dir = scratch_dir("cache_reuse");
        let path = dir.join("domainparsertld.json");

        let source = Arc::new(StaticSource::new(SUFFIX_LIST));
        let options = LoaderOptions::new().with_cache_path(&path);

        let first = CatalogLoader::new(options.clone()).with_source(Arc::clone(&source));
        assert_eq!(first.ensure_loaded().unwrap().origin, CatalogOrigin::Fetched);
        assert!(path.exists());

        // A second process sees the fresh cache file
        let second = CatalogLoader::new(options).with_source(Arc::clone(&source));
        let loaded = second.ensure_loaded().unwrap();
        assert_eq!(loaded.origin, CatalogOrigin::Cache);
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(
            loaded.catalog.groups(),
            first.current().unwrap().groups()
        );

        // Cleanup
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_cache_file_is_rebuilt() {
        let dir = scratch_dir("cache_corrupt");
        let path = dir.join("domainparsertld.json");
        fs::write(&path, b"not json").unwrap();

        let loader = CatalogLoader::new(LoaderOptions::new().with_cache_path(&path))
            .with_source(StaticSource::new(SUFFIX_LIST));
        assert_eq!(loader.ensure_loaded().unwrap().origin, CatalogOrigin::Fetched);

        let bytes = FileCacheStore.read(&path).unwrap().unwrap();
        assert!(CacheRecord::from_bytes(&bytes).is_ok());

        // Cleanup
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stale_cache_file_used_when_offline() {
        let dir = scratch_dir("cache_offline");
        let path = dir.join("domainparsertld.json");
        fs::write(&path, org_record(1_000).to_bytes().unwrap()).unwrap();

        let loader = CatalogLoader::new(LoaderOptions::new().with_cache_path(&path))
            .with_source(NilSource);
        let loaded = loader.ensure_loaded().unwrap();

        assert_eq!(loaded.origin, CatalogOrigin::StaleCache);
        assert_eq!(loaded.catalog.group("org").unwrap(), &["org"]);

        // Cleanup
        let _ = fs::remove_dir_all(&dir);
    }
}

mod refresh_tests {
    use super::*;

    const CACHE_PATH: &str = "/mem/domainparsertld.json";

    #[test]
    fn test_no_cache_and_fetch_failure() {
        let loader = CatalogLoader::new(LoaderOptions::new().with_cache_path(CACHE_PATH))
            .with_source(NilSource)
            .with_store(MemoryCacheStore::new());

        let err = loader.ensure_loaded().unwrap_err();
        assert!(matches!(err, DomainError::Connect(_)), "got: {:?}", err);
    }

    #[test]
    fn test_supplementary_change_forces_refresh() {
        let store = MemoryCacheStore::new();
        let written_at = now_secs() - 60;
        store.insert(CACHE_PATH, org_record(written_at).to_bytes().unwrap());

        let source = Arc::new(StaticSource::new(SUFFIX_LIST));
        let supplementary = SupplementaryList::new(SuffixGroups::new(), written_at + 30);
        let loader = CatalogLoader::new(
            LoaderOptions::new()
                .with_cache_path(CACHE_PATH)
                .with_supplementary(supplementary),
        )
        .with_source(Arc::clone(&source))
        .with_store(store);

        // Well within the TTL, but the supplementary list is newer
        assert_eq!(loader.ensure_loaded().unwrap().origin, CatalogOrigin::Fetched);
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn test_short_ttl_expires_record() {
        let store = MemoryCacheStore::new();
        store.insert(CACHE_PATH, org_record(now_secs() - 120).to_bytes().unwrap());

        let loader = CatalogLoader::new(
            LoaderOptions::new()
                .with_cache_path(CACHE_PATH)
                .with_cache_ttl(Duration::from_secs(60))
                .with_supplementary(SupplementaryList::empty()),
        )
        .with_source(StaticSource::new(SUFFIX_LIST))
        .with_store(store);

        let loaded = loader.ensure_loaded().unwrap();
        assert_eq!(loaded.origin, CatalogOrigin::Fetched);
        assert!(loaded.catalog.group("org").is_none());
    }

    #[test]
    fn test_refresh_replaces_published_catalog() {
        let loader = CatalogLoader::new(LoaderOptions::new().with_cache_path(CACHE_PATH))
            .with_source(StaticSource::new(SUFFIX_LIST))
            .with_store(MemoryCacheStore::new());

        let before = loader.ensure_loaded().unwrap().catalog;
        loader.reload();
        let after = loader.ensure_loaded().unwrap().catalog;

        // Old readers keep their snapshot; the new one is a separate value
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.groups(), after.groups());
    }

    #[test]
    fn test_concurrent_loads_share_one_catalog() {
        let source = Arc::new(StaticSource::new(SUFFIX_LIST));
        let loader = Arc::new(
            CatalogLoader::new(LoaderOptions::new().with_cache_path(CACHE_PATH))
                .with_source(Arc::clone(&source))
                .with_store(MemoryCacheStore::new()),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = Arc::clone(&loader);
                std::thread::spawn(move || loader.ensure_loaded().unwrap().catalog)
            })
            .collect();

        let catalogs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for catalog in &catalogs {
            assert!(Arc::ptr_eq(catalog, &catalogs[0]));
        }
        assert_eq!(source.fetch_count(), 1);
    }
}

mod custom_group_tests {
    use super::*;

    const CACHE_PATH: &str = "/mem/domainparsertld.json";

    #[test]
    fn test_custom_group_replaces_builtin_group() {
        let loader = CatalogLoader::new(
            LoaderOptions::new()
                .with_cache_path(CACHE_PATH)
                .add_custom_group("io", ["example.io"]),
        )
        .with_source(StaticSource::new(SUFFIX_LIST))
        .with_store(MemoryCacheStore::new());

        let catalog = loader.ensure_loaded().unwrap().catalog;
        assert_eq!(catalog.group("io").unwrap(), &["example.io"]);
    }

    #[test]
    fn test_custom_group_used_for_matching() {
        let loader = CatalogLoader::new(
            LoaderOptions::new()
                .with_cache_path(CACHE_PATH)
                .add_custom_group("local", ["corp.local"]),
        )
        .with_source(StaticSource::new(SUFFIX_LIST))
        .with_store(MemoryCacheStore::new());

        let result = DomainParser::new(loader)
            .parse("intranet.corp.local", "com")
            .unwrap();
        assert_eq!(result.domain, "intranet");
        assert_eq!(result.suffix, "corp.local");
        assert_eq!(result.suffix_group, "local");
    }

    #[test]
    fn test_custom_group_replaces_builtin_group_in_cached_catalog() {
        let store = Arc::new(MemoryCacheStore::new());
        let source = Arc::new(StaticSource::new(SUFFIX_LIST));

        let plain = CatalogLoader::new(LoaderOptions::new().with_cache_path(CACHE_PATH))
            .with_source(Arc::clone(&source))
            .with_store(Arc::clone(&store));
        let written = plain.ensure_loaded().unwrap().catalog;
        assert_eq!(written.group("io").unwrap(), &["github.io", "gitlab.io"]);

        let custom = CatalogLoader::new(
            LoaderOptions::new()
                .with_cache_path(CACHE_PATH)
                .add_custom_group("io", ["example.io"]),
        )
        .with_source(Arc::clone(&source))
        .with_store(Arc::clone(&store));
        let loaded = custom.ensure_loaded().unwrap();

        assert_eq!(loaded.origin, CatalogOrigin::Cache);
        assert_eq!(loaded.catalog.group("io").unwrap(), &["example.io"]);
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn test_custom_group_not_visible_to_other_loaders() {
        let dir = scratch_dir("custom_private");
        let path = dir.join("domainparsertld.json");
        let source = Arc::new(StaticSource::new(SUFFIX_LIST));

        let custom = CatalogLoader::new(
            LoaderOptions::new()
                .with_cache_path(&path)
                .add_custom_group("local", ["corp.local"]),
        )
        .with_source(Arc::clone(&source));
        assert!(custom.ensure_loaded().unwrap().catalog.group("local").is_some());

        let plain = CatalogLoader::new(LoaderOptions::new().with_cache_path(&path))
            .with_source(Arc::clone(&source));
        let loaded = plain.ensure_loaded().unwrap();
        assert_eq!(loaded.origin, CatalogOrigin::Cache);
        assert!(loaded.catalog.group("local").is_none());

        // Cleanup
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_custom_group_applied_to_cached_catalog() {
        let store = MemoryCacheStore::new();
        store.insert(CACHE_PATH, org_record(now_secs()).to_bytes().unwrap());

        let loader = CatalogLoader::new(
            LoaderOptions::new()
                .with_cache_path(CACHE_PATH)
                .with_supplementary(SupplementaryList::empty())
                .add_custom_group("org", ["example.org"]),
        )
        .with_source(NilSource)
        .with_store(store);

        let loaded = loader.ensure_loaded().unwrap();
        assert_eq!(loaded.origin, CatalogOrigin::Cache);
        assert_eq!(loaded.catalog.group("org").unwrap(), &["example.org", "org"]);
    }
}
