//! Shader Preprocessor
//!
//! Turns a batch of raw module sources into include-free code:
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Dependency scan | [`deps`] | direct includes per module |
//! | Closure ranking | [`closure`] | depth-ordered transitive includes per module |
//! | Code assembly | [`assemble`] | concatenated text, directives stripped |
//!
//! Includes that name a module outside the batch are reported in
//! [`Assembly::missing`] so the loader can fetch them and run again.

pub mod assemble;
pub mod closure;
pub mod deps;

use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use assemble::{Assembly, assemble, strip_includes};
pub use closure::{Closure, resolve_all, resolve_closure};
pub use deps::{DependencyMap, direct_dependencies, includes_of};

use crate::assets::storage::ShaderCache;
use crate::key::ModuleKey;
use crate::options::LoaderOptions;

pub struct Preprocessor {
    cache: Arc<ShaderCache>,
    options: Arc<LoaderOptions>,
}

impl Preprocessor {
    #[must_use]
    pub fn new(cache: Arc<ShaderCache>, options: Arc<LoaderOptions>) -> Self {
        Self { cache, options }
    }

    /// Runs all three stages over `sources`.
    pub fn process(&self, sources: &FxHashMap<ModuleKey, Arc<str>>) -> Assembly {
        let deps = direct_dependencies(sources, &self.options);
        let closures = resolve_all(&deps, &self.options);
        assemble(sources, &closures, &self.cache, &self.options)
    }
}
