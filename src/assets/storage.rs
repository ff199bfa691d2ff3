use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::key::ModuleKey;

// Internal data structure, protected by a lock.
pub type SourceMap = FxHashMap<ModuleKey, Arc<str>>;

/// Thread-safe `ModuleKey → text` table. Entries are never evicted.
#[derive(Default)]
pub struct SourceStorage {
    inner: RwLock<SourceMap>,
}

impl SourceStorage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::default(),
        }
    }

    /// [Write] Stores `text` under `key`, replacing any previous entry.
    pub fn insert(&self, key: ModuleKey, text: impl Into<Arc<str>>) -> Arc<str> {
        let text = text.into();
        self.inner.write().insert(key, Arc::clone(&text));
        text
    }

    /// [Read] Gets a single entry.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        self.inner.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Raw and processed shader sources shared by every load of one loader.
///
/// Lives as long as the owning [`ShaderLoader`](crate::ShaderLoader) and its
/// clones; handed explicitly to fetch tasks and the assembler.
#[derive(Default)]
pub struct ShaderCache {
    /// Fetched source text, exactly as read.
    pub raw: SourceStorage,
    /// Assembled text: includes inlined, directives stripped.
    pub processed: SourceStorage,
}

impl ShaderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let storage = SourceStorage::new();
        storage.insert(ModuleKey::from_canonical("common"), "float PI = 3.14;");
        assert_eq!(storage.get("common").as_deref(), Some("float PI = 3.14;"));
        assert!(storage.get("missing").is_none());
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let storage = SourceStorage::new();
        let key = ModuleKey::from_canonical("fragment_foo");
        storage.insert(key.clone(), "a");
        storage.insert(key, "b");
        assert_eq!(storage.get("fragment_foo").as_deref(), Some("b"));
        assert_eq!(storage.len(), 1);
    }
}
