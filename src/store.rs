//! Shader Store
//!
//! Path-addressable view over the assembled sources of one successful load.
//!
//! Modules are nested by their file path segments, so `lighting/phong_fragment`
//! (canonical key `lighting_fragment_phong`) lives at
//! `lighting → phong_fragment`. Lookups run the reference through the same
//! normalizer and path derivation used when the store was built.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::key::{ModuleKey, normalize};
use crate::options::LoaderOptions;

/// One level of the store. A node can hold a source and children at once
/// (`common.glsl` next to `common/math.glsl`).
#[derive(Debug, Clone, Default)]
pub struct StoreNode {
    source: Option<Arc<str>>,
    children: BTreeMap<String, StoreNode>,
}

impl StoreNode {
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn child(&self, segment: &str) -> Option<&StoreNode> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &StoreNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Assembled shader sources of one load, nested by path.
#[derive(Debug, Clone, Default)]
pub struct ShaderStore {
    root: StoreNode,
    flat: BTreeMap<ModuleKey, Arc<str>>,
    options: Arc<LoaderOptions>,
}

impl ShaderStore {
    /// Builds a store from canonical keys and their assembled text.
    #[must_use]
    pub fn build(
        code: impl IntoIterator<Item = (ModuleKey, Arc<str>)>,
        options: Arc<LoaderOptions>,
    ) -> Self {
        let mut store = Self {
            root: StoreNode::default(),
            flat: BTreeMap::new(),
            options,
        };
        for (key, text) in code {
            store.insert(key, text);
        }
        store
    }

    fn insert(&mut self, key: ModuleKey, text: Arc<str>) {
        let mut node = &mut self.root;
        for segment in key.path_segments(&self.options) {
            node = node.children.entry(segment).or_default();
        }
        node.source = Some(Arc::clone(&text));
        self.flat.insert(key, text);
    }

    /// Looks a module up by any reference form (`foo_fragment`,
    /// `lighting/phong_fragment.glsl`, `fragment_foo`, ...).
    #[must_use]
    pub fn path(&self, reference: &str) -> Option<&str> {
        let key = normalize(reference, &self.options);
        let mut node = &self.root;
        for segment in key.path_segments(&self.options) {
            node = node.children.get(&segment)?;
        }
        node.source()
    }

    /// Looks a module up by canonical key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.flat.get(key).map(|s| &**s)
    }

    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        self.path(reference).is_some()
    }

    #[must_use]
    pub fn root(&self) -> &StoreNode {
        &self.root
    }

    /// Canonical keys and sources, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleKey, &str)> {
        self.flat.iter().map(|(k, v)| (k, &**v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }
}
