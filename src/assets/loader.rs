//! Shader Loader
//!
//! Drives fetch rounds and preprocessing until every requested module and its
//! transitive includes are assembled. Each round fetches the request set,
//! processes it, and extends the set with the includes that were missing.

use std::sync::{Arc, OnceLock};

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use crate::assets::fetch::FetchTask;
use crate::assets::io::SourceReaderVariant;
use crate::assets::storage::ShaderCache;
use crate::errors::{Error, Result};
use crate::key::{ModuleKey, normalize, normalize_all};
use crate::options::LoaderOptions;
use crate::preprocess::Preprocessor;
use crate::store::ShaderStore;

fn get_loader_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create shader loader runtime"))
}

/// Loads shader modules and resolves their includes.
///
/// Cheap to clone; clones share the raw and processed caches, so a module is
/// read from the source at most once per loader no matter how many loads
/// reference it.
///
/// ```rust,ignore
/// let loader = ShaderLoader::from_source("https://cdn.example.com/app/", LoaderOptions::default())?;
/// let store = loader.load_async(["lighting/phong_fragment", "generic_vertex"]).await?;
/// let fragment = store.path("lighting/phong_fragment");
/// ```
#[derive(Clone)]
pub struct ShaderLoader {
    cache: Arc<ShaderCache>,
    reader: SourceReaderVariant,
    options: Arc<LoaderOptions>,
}

impl Default for ShaderLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderLoader {
    /// Loader with default options reading from the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(LoaderOptions::default())
    }

    #[must_use]
    pub fn with_options(options: LoaderOptions) -> Self {
        Self {
            cache: Arc::new(ShaderCache::new()),
            reader: SourceReaderVariant::default(),
            options: Arc::new(options),
        }
    }

    /// Loader reading from a directory or an `http(s)://` root.
    pub fn from_source(source: &str, options: LoaderOptions) -> Result<Self> {
        Ok(Self::with_options(options).with_reader(SourceReaderVariant::from_source(source)?))
    }

    /// Replaces the source reader. Caches are kept.
    #[must_use]
    pub fn with_reader(mut self, reader: impl Into<SourceReaderVariant>) -> Self {
        self.reader = reader.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<ShaderCache> {
        &self.cache
    }

    /// Canonical key of `reference` under this loader's options.
    #[must_use]
    pub fn normalize(&self, reference: &str) -> ModuleKey {
        normalize(reference, &self.options)
    }

    /// Last assembled text of a module, by any reference form.
    #[must_use]
    pub fn processed(&self, reference: &str) -> Option<Arc<str>> {
        self.cache.processed.get(self.normalize(reference).as_str())
    }

    /// Raw fetched text of a module, by any reference form.
    #[must_use]
    pub fn raw(&self, reference: &str) -> Option<Arc<str>> {
        self.cache.raw.get(self.normalize(reference).as_str())
    }

    // ========================================================================
    // Async API
    // ========================================================================

    /// Fetches `names` and every module they transitively include, then
    /// returns their assembled sources.
    ///
    /// Includes outside the request are fetched in further rounds until the
    /// closure is complete. Any fetch failure fails the whole call.
    pub async fn load_async<I, S>(&self, names: I) -> Result<ShaderStore>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut requested = normalize_all(names, &self.options);
        let preprocessor = Preprocessor::new(Arc::clone(&self.cache), Arc::clone(&self.options));
        let mut rounds = 0usize;

        loop {
            rounds += 1;

            let task = FetchTask::new(
                Arc::clone(&self.cache),
                self.reader.clone(),
                Arc::clone(&self.options),
            );
            let sources = task.run(&requested).await.into_sources().inspect_err(|e| {
                log::error!("{e}");
            })?;

            let assembly = preprocessor.process(&sources);

            if assembly.missing.is_empty() {
                let code = requested
                    .iter()
                    .filter_map(|k| assembly.code.get(k).map(|text| (k.clone(), Arc::clone(text))));
                return Ok(ShaderStore::build(code, Arc::clone(&self.options)));
            }

            let unresolved: Vec<String> = assembly
                .missing
                .iter()
                .filter(|m| requested.contains(m))
                .map(ToString::to_string)
                .collect();
            if !unresolved.is_empty() {
                let err = Error::UnresolvedInclude {
                    modules: unresolved,
                };
                log::error!("{err}");
                return Err(err);
            }

            let missing: Vec<String> = assembly.missing.iter().map(ToString::to_string).collect();
            if rounds > self.options.max_retries {
                let err = Error::RetryLimitExceeded { rounds, missing };
                log::error!("{err}");
                return Err(err);
            }

            log::info!("loading missing includes: {}", missing.join(", "));
            requested.extend(assembly.missing);
        }
    }

    // ========================================================================
    // Callback / Blocking API
    // ========================================================================

    /// Callback form of [`load_async`](Self::load_async).
    ///
    /// Runs on the ambient tokio runtime when there is one, otherwise on the
    /// loader's own runtime. `callback` receives `(store, true)` on success and
    /// an empty store with `false` on any failure.
    pub fn load<I, S, F>(&self, names: I, callback: F) -> JoinHandle<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnOnce(ShaderStore, bool) + Send + 'static,
    {
        let names: Vec<String> = names.into_iter().map(|s| s.as_ref().to_string()).collect();
        let loader = self.clone();

        let job = async move {
            match loader.load_async(names).await {
                Ok(store) => callback(store, true),
                Err(_) => callback(ShaderStore::default(), false),
            }
        };

        match Handle::try_current() {
            Ok(handle) => handle.spawn(job),
            Err(_) => get_loader_runtime().spawn(job),
        }
    }

    /// Blocking form of [`load_async`](Self::load_async).
    ///
    /// Must not be called from within an async context.
    pub fn load_blocking<I, S>(&self, names: I) -> Result<ShaderStore>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        get_loader_runtime().block_on(self.load_async(names))
    }
}
