//! Dataset and split memoization
//!
//! Two LRU tables avoid redundant work across interactions: encoded
//! datasets keyed by source fingerprint, and splits keyed by fingerprint
//! plus split parameters. Encoded datasets can additionally be persisted
//! as JSON snapshots so a restart does not re-read the source.

use crate::core::{ClassifyError, DataSource, Fingerprint, Result, Split, SplitConfig};
use crate::data::{self, DatasetSchema, EncodedDataset};
use crate::persistence::{DatasetSnapshot, SnapshotMetadata};
use log::{debug, info, warn};
use lru::LruCache;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache key for splits; `test_size` is stored by bit pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SplitKey {
    fingerprint: Fingerprint,
    label: String,
    test_size_bits: u64,
    seed: u64,
}

impl SplitKey {
    fn new(fingerprint: &Fingerprint, label: &str, config: &SplitConfig) -> Self {
        Self {
            fingerprint: fingerprint.clone(),
            label: label.to_string(),
            test_size_bits: config.test_size.to_bits(),
            seed: config.seed,
        }
    }
}

/// LRU memoization of encoded datasets and their splits
pub struct DatasetCache {
    datasets: LruCache<Fingerprint, Arc<EncodedDataset>>,
    splits: LruCache<SplitKey, Arc<Split>>,
    snapshot_dir: Option<PathBuf>,
    hits: u64,
    disk_hits: u64,
    misses: u64,
    split_hits: u64,
    split_misses: u64,
}

impl DatasetCache {
    /// Create an in-memory cache holding up to `capacity` entries per table
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            datasets: LruCache::new(capacity),
            splits: LruCache::new(capacity),
            snapshot_dir: None,
            hits: 0,
            disk_hits: 0,
            misses: 0,
            split_hits: 0,
            split_misses: 0,
        }
    }

    /// Also persist encoded datasets under `dir`
    pub fn with_snapshot_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.snapshot_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn snapshot_dir(&self) -> Option<&Path> {
        self.snapshot_dir.as_deref()
    }

    /// Encoded table for `source`, loading it only when no cached copy
    /// matches the source's current fingerprint
    pub fn load(
        &mut self,
        source: &dyn DataSource,
        schema: &DatasetSchema,
    ) -> Result<(Fingerprint, Arc<EncodedDataset>)> {
        let fingerprint = source.fingerprint()?;

        if let Some(dataset) = self.datasets.get(&fingerprint) {
            let dataset = Arc::clone(dataset);
            self.hits += 1;
            debug!("Dataset cache hit for {}", fingerprint.short());
            validate_cached(schema, &dataset)?;
            return Ok((fingerprint, dataset));
        }

        if let Some(dataset) = self.load_snapshot(&fingerprint) {
            validate_cached(schema, &dataset)?;
            self.disk_hits += 1;
            let dataset = Arc::new(dataset);
            self.datasets.put(fingerprint.clone(), Arc::clone(&dataset));
            return Ok((fingerprint, dataset));
        }

        self.misses += 1;
        debug!("Dataset cache miss for {}", fingerprint.short());
        let dataset = data::load_data(source, schema)?;
        self.store_snapshot(&fingerprint, &source.describe(), &dataset);

        let dataset = Arc::new(dataset);
        self.datasets.put(fingerprint.clone(), Arc::clone(&dataset));
        Ok((fingerprint, dataset))
    }

    /// Split of a cached table, computed once per (fingerprint, label, config)
    pub fn split(
        &mut self,
        fingerprint: &Fingerprint,
        dataset: &EncodedDataset,
        label: &str,
        config: &SplitConfig,
    ) -> Result<Arc<Split>> {
        let key = SplitKey::new(fingerprint, label, config);
        if let Some(split) = self.splits.get(&key) {
            self.split_hits += 1;
            debug!("Split cache hit for {} (seed {})", fingerprint.short(), config.seed);
            return Ok(Arc::clone(split));
        }

        self.split_misses += 1;
        let split = Arc::new(data::split(dataset, label, config)?);
        self.splits.put(key, Arc::clone(&split));
        Ok(split)
    }

    /// Drop everything held in memory and on disk
    pub fn invalidate(&mut self) -> Result<usize> {
        self.datasets.clear();
        self.splits.clear();

        let mut removed = 0;
        for path in self.snapshot_paths()? {
            fs::remove_file(&path).map_err(|e| {
                ClassifyError::Cache(format!("cannot remove {}: {e}", path.display()))
            })?;
            removed += 1;
        }
        info!("Cache invalidated ({} snapshot(s) removed)", removed);
        Ok(removed)
    }

    /// Drop the entries derived from one source snapshot
    pub fn invalidate_source(&mut self, fingerprint: &Fingerprint) -> Result<()> {
        self.datasets.pop(fingerprint);

        let stale: Vec<SplitKey> = self
            .splits
            .iter()
            .filter(|(key, _)| &key.fingerprint == fingerprint)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.splits.pop(key);
        }

        if let Some(dir) = &self.snapshot_dir {
            let path = DatasetSnapshot::path_in(dir, fingerprint);
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    ClassifyError::Cache(format!("cannot remove {}: {e}", path.display()))
                })?;
            }
        }
        debug!(
            "Invalidated {} and {} split(s)",
            fingerprint.short(),
            stale.len()
        );
        Ok(())
    }

    /// Metadata of every readable snapshot on disk
    pub fn snapshots(&self) -> Result<Vec<SnapshotMetadata>> {
        let mut found = Vec::new();
        for path in self.snapshot_paths()? {
            match DatasetSnapshot::load_from_file(&path) {
                Ok(snapshot) => found.push(snapshot.metadata),
                Err(e) => warn!("Skipping unreadable snapshot {}: {}", path.display(), e),
            }
        }
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    /// Get cache hit rate across both tables
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits + self.disk_hits + self.split_hits;
        let total = hits + self.misses + self.split_misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            disk_hits: self.disk_hits,
            misses: self.misses,
            split_hits: self.split_hits,
            split_misses: self.split_misses,
            capacity: self.datasets.cap().get(),
            datasets: self.datasets.len(),
            splits: self.splits.len(),
        }
    }

    fn snapshot_paths(&self) -> Result<Vec<PathBuf>> {
        let Some(dir) = &self.snapshot_dir else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let entries = fs::read_dir(dir).map_err(|e| {
            ClassifyError::Cache(format!("cannot list {}: {e}", dir.display()))
        })?;
        for entry in entries {
            let path = entry?.path();
            let is_snapshot = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("dataset-") && name.ends_with(".json"))
                .unwrap_or(false);
            if is_snapshot {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn load_snapshot(&self, fingerprint: &Fingerprint) -> Option<EncodedDataset> {
        let path = DatasetSnapshot::path_in(self.snapshot_dir.as_ref()?, fingerprint);
        if !path.exists() {
            return None;
        }

        match DatasetSnapshot::load_from_file(&path) {
            Ok(snapshot) if snapshot.matches(fingerprint) => {
                debug!("Restored dataset from snapshot {}", path.display());
                Some(snapshot.dataset)
            }
            Ok(_) => {
                warn!("Ignoring stale snapshot {}; rebuilding", path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring corrupt snapshot {}: {}; rebuilding", path.display(), e);
                None
            }
        }
    }

    fn store_snapshot(&self, fingerprint: &Fingerprint, source: &str, dataset: &EncodedDataset) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        let path = DatasetSnapshot::path_in(dir, fingerprint);
        let snapshot = DatasetSnapshot::new(fingerprint.clone(), source, dataset.clone());
        if let Err(e) = snapshot.save_to_file(&path) {
            // the in-memory entry is still usable
            warn!("Could not persist snapshot {}: {}", path.display(), e);
        }
    }
}

fn validate_cached(schema: &DatasetSchema, dataset: &EncodedDataset) -> Result<()> {
    let headers: Vec<String> = dataset.column_names().into_iter().map(String::from).collect();
    schema.validate(&headers)
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub split_hits: u64,
    pub split_misses: u64,
    pub capacity: usize,
    pub datasets: usize,
    pub splits: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClassifyError;
    use crate::data::InMemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TABLE: &str = "type,odor\ne,a\np,f\ne,l\np,y\ne,n\np,f\ne,a\np,c\ne,n\np,s\n";

    /// Source that counts how often its contents are read
    struct CountingSource {
        inner: InMemorySource,
        reads: AtomicUsize,
    }

    impl CountingSource {
        fn new(contents: &str) -> Self {
            Self {
                inner: InMemorySource::new("counting", contents),
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl DataSource for CountingSource {
        fn describe(&self) -> String {
            self.inner.describe()
        }

        fn fingerprint(&self) -> Result<Fingerprint> {
            self.inner.fingerprint()
        }

        fn read(&self) -> Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read()
        }
    }

    fn schema() -> DatasetSchema {
        DatasetSchema::label_only("type")
    }

    #[test]
    fn test_second_load_is_a_hit() {
        let source = CountingSource::new(TABLE);
        let mut cache = DatasetCache::new(4);

        let (fp1, first) = cache.load(&source, &schema()).unwrap();
        let (fp2, second) = cache.load(&source, &schema()).unwrap();

        assert_eq!(fp1, fp2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_split_memoized_per_config() {
        let source = InMemorySource::new("memory", TABLE);
        let mut cache = DatasetCache::new(4);
        let (fp, dataset) = cache.load(&source, &schema()).unwrap();

        let config = SplitConfig::default();
        let a = cache.split(&fp, &dataset, "type", &config).unwrap();
        let b = cache.split(&fp, &dataset, "type", &config).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let other = SplitConfig { seed: 3, ..config };
        let c = cache.split(&fp, &dataset, "type", &other).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));

        let stats = cache.stats();
        assert_eq!(stats.split_hits, 1);
        assert_eq!(stats.split_misses, 2);
        assert_eq!(stats.splits, 2);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = DatasetCache::new(1);
        let a = InMemorySource::new("a", TABLE);
        let b = InMemorySource::new("b", format!("{}e,a\n", TABLE));

        cache.load(&a, &schema()).unwrap();
        cache.load(&b, &schema()).unwrap(); // evicts a
        cache.load(&a, &schema()).unwrap();

        assert_eq!(cache.stats().misses, 3);
        assert_eq!(cache.stats().datasets, 1);
    }

    #[test]
    fn test_invalidate_source_forces_reload() {
        let source = CountingSource::new(TABLE);
        let mut cache = DatasetCache::new(4);
        let (fp, dataset) = cache.load(&source, &schema()).unwrap();
        cache.split(&fp, &dataset, "type", &SplitConfig::default()).unwrap();

        cache.invalidate_source(&fp).unwrap();
        assert_eq!(cache.stats().splits, 0);

        cache.load(&source, &schema()).unwrap();
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_snapshot_survives_new_cache() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = CountingSource::new(TABLE);

        let mut cache = DatasetCache::new(4).with_snapshot_dir(dir.path());
        let (_, original) = cache.load(&source, &schema()).unwrap();

        let mut restarted = DatasetCache::new(4).with_snapshot_dir(dir.path());
        let (_, restored) = restarted.load(&source, &schema()).unwrap();

        assert_eq!(*original, *restored);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert_eq!(restarted.stats().disk_hits, 1);
        assert_eq!(restarted.snapshots().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_rebuilt() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = CountingSource::new(TABLE);
        let fp = source.fingerprint().unwrap();
        fs::write(DatasetSnapshot::path_in(dir.path(), &fp), "garbage").unwrap();

        let mut cache = DatasetCache::new(4).with_snapshot_dir(dir.path());
        let (_, dataset) = cache.load(&source, &schema()).unwrap();
        assert_eq!(dataset.n_rows(), 10);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);

        // the rebuilt snapshot replaced the corrupt file
        let snapshot = DatasetSnapshot::load_from_file(DatasetSnapshot::path_in(dir.path(), &fp));
        assert!(snapshot.is_ok());
    }

    #[test]
    fn test_invalidate_clears_disk() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = InMemorySource::new("memory", TABLE);
        let mut cache = DatasetCache::new(4).with_snapshot_dir(dir.path());
        cache.load(&source, &schema()).unwrap();

        assert_eq!(cache.invalidate().unwrap(), 1);
        assert!(cache.snapshots().unwrap().is_empty());
        assert_eq!(cache.stats().datasets, 0);
    }

    #[test]
    fn test_cached_table_still_checked_against_schema() {
        let source = InMemorySource::new("memory", TABLE);
        let mut cache = DatasetCache::new(4);
        cache.load(&source, &schema()).unwrap();

        let result = cache.load(&source, &DatasetSchema::label_only("class"));
        assert!(matches!(result, Err(ClassifyError::InvalidSchema(_))));
    }

    #[test]
    fn test_hit_rate_calculation() {
        let source = InMemorySource::new("memory", TABLE);
        let mut cache = DatasetCache::new(4);
        assert_eq!(cache.hit_rate(), 0.0);

        cache.load(&source, &schema()).unwrap();
        cache.load(&source, &schema()).unwrap();
        assert_eq!(cache.hit_rate(), 0.5);
    }
}
