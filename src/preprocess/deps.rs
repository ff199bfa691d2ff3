use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::key::{ModuleKey, normalize};
use crate::options::LoaderOptions;

/// Module → modules it includes directly, in file order, duplicates kept.
pub type DependencyMap = FxHashMap<ModuleKey, Vec<ModuleKey>>;

/// Includes of a single source, normalized.
#[must_use]
pub fn includes_of(source: &str, options: &LoaderOptions) -> Vec<ModuleKey> {
    source
        .lines()
        .filter_map(|line| options.include_target(line))
        .map(|target| normalize(target, options))
        .collect()
}

/// Scans every source for include directives.
#[must_use]
pub fn direct_dependencies(
    sources: &FxHashMap<ModuleKey, Arc<str>>,
    options: &LoaderOptions,
) -> DependencyMap {
    sources
        .iter()
        .map(|(key, source)| (key.clone(), includes_of(source, options)))
        .collect()
}
