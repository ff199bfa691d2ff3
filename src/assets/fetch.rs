//! Fetch Task
//!
//! Retrieves the raw text of a batch of modules, from the shared raw cache when
//! possible and through the [`SourceReaderVariant`] otherwise. All cache misses
//! are read concurrently; the batch completes once every key has settled.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use rustc_hash::FxHashMap;

use crate::assets::io::SourceReaderVariant;
use crate::assets::storage::ShaderCache;
use crate::errors::{Error, Result};
use crate::key::ModuleKey;
use crate::options::LoaderOptions;

/// Per-key outcome of a fetch batch.
#[derive(Debug, Default)]
pub struct FetchResults {
    keys: Vec<ModuleKey>,
    settled: FxHashMap<ModuleKey, Result<Arc<str>>>,
}

impl FetchResults {
    fn with_keys(keys: Vec<ModuleKey>) -> Self {
        Self {
            keys,
            settled: FxHashMap::default(),
        }
    }

    fn settle(&mut self, key: ModuleKey, outcome: Result<Arc<str>>) {
        self.settled.insert(key, outcome);
    }

    /// True once every requested key has a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.keys.iter().all(|k| self.settled.contains_key(k))
    }

    /// Requested keys, de-duplicated, in request order.
    #[must_use]
    pub fn keys(&self) -> &[ModuleKey] {
        &self.keys
    }

    /// Keys whose retrieval failed, in request order.
    #[must_use]
    pub fn failed(&self) -> Vec<&ModuleKey> {
        self.keys
            .iter()
            .filter(|k| matches!(self.settled.get(*k), Some(Err(_))))
            .collect()
    }

    /// Splits into the fetched sources, or a [`Error::FetchFailed`] naming
    /// every failed key.
    pub fn into_sources(self) -> Result<FxHashMap<ModuleKey, Arc<str>>> {
        let failed: Vec<String> = self.failed().iter().map(ToString::to_string).collect();
        if !failed.is_empty() {
            return Err(Error::FetchFailed { keys: failed });
        }

        Ok(self
            .settled
            .into_iter()
            .filter_map(|(key, outcome)| outcome.ok().map(|text| (key, text)))
            .collect())
    }
}

/// One batch retrieval over a shared cache and reader.
pub struct FetchTask {
    cache: Arc<ShaderCache>,
    reader: SourceReaderVariant,
    options: Arc<LoaderOptions>,
}

impl FetchTask {
    #[must_use]
    pub fn new(
        cache: Arc<ShaderCache>,
        reader: SourceReaderVariant,
        options: Arc<LoaderOptions>,
    ) -> Self {
        Self {
            cache,
            reader,
            options,
        }
    }

    /// Settles every key and returns the results.
    pub async fn run(&self, keys: &[ModuleKey]) -> FetchResults {
        let mut unique: Vec<ModuleKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.contains(key) {
                unique.push(key.clone());
            }
        }

        let mut results = FetchResults::with_keys(unique.clone());
        let mut pending = FuturesUnordered::new();

        for key in unique {
            if let Some(text) = self.cache.raw.get(key.as_str()) {
                log::debug!("shader cache hit: {key}");
                results.settle(key, Ok(text));
            } else {
                pending.push(self.retrieve(key));
            }
        }

        while let Some((key, outcome)) = pending.next().await {
            results.settle(key, outcome);
        }

        debug_assert!(results.is_complete());
        results
    }

    /// Runs the batch on the current tokio runtime and hands the results to
    /// `on_done` exactly once.
    pub fn spawn<F>(self, keys: Vec<ModuleKey>, on_done: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(FetchResults) + Send + 'static,
    {
        tokio::spawn(async move {
            let results = self.run(&keys).await;
            on_done(results);
        })
    }

    async fn retrieve(&self, key: ModuleKey) -> (ModuleKey, Result<Arc<str>>) {
        let uri = key.uri(&self.options);
        log::debug!("fetching shader {key} from {uri}");

        let outcome = match self.reader.read_text(&uri).await {
            Ok(text) if text.is_empty() => Err(Error::EmptySource(uri)),
            Ok(text) => Ok(self.cache.raw.insert(key.clone(), text)),
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            log::warn!("failed to fetch shader {key}: {e}");
        }

        (key, outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::assets::io::MemorySourceReader;

    fn task(reader: &Arc<MemorySourceReader>) -> (FetchTask, Arc<ShaderCache>) {
        let cache = Arc::new(ShaderCache::new());
        let task = FetchTask::new(
            Arc::clone(&cache),
            SourceReaderVariant::from(Arc::clone(reader)),
            Arc::new(LoaderOptions::default()),
        );
        (task, cache)
    }

    #[test]
    fn test_run_populates_cache() {
        let reader = Arc::new(MemorySourceReader::new().with_source("shaders/common.glsl", "float PI;"));
        let (task, cache) = task(&reader);
        let key = ModuleKey::from_canonical("common");

        let results = pollster::block_on(task.run(&[key.clone(), key.clone()]));

        assert!(results.is_complete());
        assert_eq!(results.keys().len(), 1);
        assert_eq!(cache.raw.get("common").as_deref(), Some("float PI;"));
        assert_eq!(reader.request_count("shaders/common.glsl"), 1);
    }

    #[test]
    fn test_cache_hit_skips_reader() {
        let reader = Arc::new(MemorySourceReader::new());
        let (task, cache) = task(&reader);
        cache.raw.insert(ModuleKey::from_canonical("common"), "cached");

        let results = pollster::block_on(task.run(&[ModuleKey::from_canonical("common")]));

        assert_eq!(reader.total_requests(), 0);
        let sources = results.into_sources().unwrap();
        assert_eq!(&*sources["common"], "cached");
    }

    #[test]
    fn test_empty_and_missing_sources_fail() {
        let reader = Arc::new(MemorySourceReader::new().with_source("shaders/empty.glsl", ""));
        let (task, cache) = task(&reader);

        let results = pollster::block_on(task.run(&[
            ModuleKey::from_canonical("empty"),
            ModuleKey::from_canonical("absent"),
        ]));

        assert_eq!(results.failed().len(), 2);
        assert!(cache.raw.is_empty());
        match results.into_sources() {
            Err(Error::FetchFailed { keys }) => assert_eq!(keys, vec!["empty", "absent"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    async fn spawn_and_count(task: FetchTask, keys: &[&str]) -> (usize, FetchResults) {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();
        let keys = keys.iter().map(|k| ModuleKey::from_canonical(*k)).collect();

        let counter = Arc::clone(&calls);
        task.spawn(keys, move |results| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(results);
        })
        .await
        .unwrap();

        let results = rx.await.unwrap();
        (calls.load(Ordering::SeqCst), results)
    }

    #[tokio::test]
    async fn test_spawn_all_cache_hits_settles_once() {
        let reader = Arc::new(MemorySourceReader::new());
        let (task, cache) = task(&reader);
        cache.raw.insert(ModuleKey::from_canonical("common"), "a");
        cache.raw.insert(ModuleKey::from_canonical("fragment_foo"), "b");

        let (calls, results) = spawn_and_count(task, &["common", "fragment_foo"]).await;

        assert_eq!(calls, 1);
        assert!(results.is_complete());
        assert!(results.failed().is_empty());
        assert_eq!(reader.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_spawn_mixed_hits_and_misses_settles_once() {
        let reader = Arc::new(MemorySourceReader::new().with_source("shaders/lights.glsl", "vec3 l;"));
        let (task, cache) = task(&reader);
        cache.raw.insert(ModuleKey::from_canonical("common"), "float c;");

        let (calls, results) = spawn_and_count(task, &["common", "lights"]).await;

        assert_eq!(calls, 1);
        assert!(results.is_complete());
        assert_eq!(reader.total_requests(), 1);
        let sources = results.into_sources().unwrap();
        assert_eq!(&*sources["common"], "float c;");
        assert_eq!(&*sources["lights"], "vec3 l;");
    }

    #[tokio::test]
    async fn test_spawn_with_failed_key_settles_once() {
        let reader = Arc::new(MemorySourceReader::new().with_source("shaders/lights.glsl", "vec3 l;"));
        let (task, cache) = task(&reader);

        let (calls, results) = spawn_and_count(task, &["lights", "absent"]).await;

        assert_eq!(calls, 1);
        assert!(results.is_complete());
        let failed: Vec<&str> = results.failed().into_iter().map(ModuleKey::as_str).collect();
        assert_eq!(failed, vec!["absent"]);
        assert!(cache.raw.get("lights").is_some());
        assert!(cache.raw.get("absent").is_none());
    }
}
