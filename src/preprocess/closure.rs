//! Closure & Depth Ranking
//!
//! For one root module, walks the include graph breadth-first and assigns
//! every reachable module the length of the longest include chain leading to
//! it. Sorting by descending depth puts the most foundational modules first,
//! so concatenating in that order places every include before its includers.
//!
//! Depths are relaxed to a fixed point: when a longer chain to an already
//! resolved module is found, the module is queued again so the increase
//! propagates to its own includes. Only a cycle can keep that going, which is
//! caught by two guards:
//!
//! - a depth larger than the number of modules in the graph,
//! - more than [`LoaderOptions::max_include_iterations`] edges expanded.
//!
//! Only the first expansion of a module counts against the edge budget.
//! Revisits that raise depth are bounded by the depth guard.
//!
//! Either guard stops the traversal with a warning and keeps what was resolved.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use super::deps::DependencyMap;
use crate::key::ModuleKey;
use crate::options::LoaderOptions;

/// The ranked include closure of one root module.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    /// Transitive includes, deepest first, ties in discovery order. Never
    /// contains the root itself.
    pub order: Vec<ModuleKey>,
    /// Maximum depth at which each module was reached.
    pub depths: FxHashMap<ModuleKey, usize>,
    /// Set when a cycle guard stopped the traversal early.
    pub truncated: bool,
}

impl Closure {
    #[must_use]
    pub fn depth(&self, key: &str) -> Option<usize> {
        self.depths.get(key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k.as_str() == key)
    }
}

/// Ranks the include closure of `root`.
#[must_use]
pub fn resolve_closure(deps: &DependencyMap, root: &ModuleKey, options: &LoaderOptions) -> Closure {
    let mut depths: FxHashMap<ModuleKey, usize> = FxHashMap::default();
    let mut resolved: Vec<ModuleKey> = Vec::new();
    let mut resolved_set: FxHashSet<ModuleKey> = FxHashSet::default();
    let mut queue: VecDeque<(ModuleKey, usize)> = VecDeque::new();
    let mut queued: FxHashSet<ModuleKey> = FxHashSet::default();

    // Longest possible acyclic chain is bounded by the number of distinct modules.
    let depth_bound = deps
        .iter()
        .flat_map(|(k, v)| std::iter::once(k).chain(v.iter()))
        .collect::<FxHashSet<_>>()
        .len();

    for dep in deps.get(root).into_iter().flatten() {
        if queued.insert(dep.clone()) {
            depths.insert(dep.clone(), 0);
            queue.push_back((dep.clone(), 0));
        }
    }

    let mut iterations = 0usize;
    let mut truncated = false;

    'relax: while let Some((name, queued_depth)) = queue.pop_front() {
        queued.remove(&name);

        let depth = depths.get(&name).copied().unwrap_or(0).max(queued_depth);
        depths.insert(name.clone(), depth);
        let first_expansion = resolved_set.insert(name.clone());
        if first_expansion {
            resolved.push(name.clone());
        }

        let Some(children) = deps.get(&name) else {
            continue;
        };

        for child in children {
            if first_expansion {
                iterations += 1;
            }
            let child_depth = depth + 1;

            if iterations > options.max_include_iterations || child_depth > depth_bound {
                log::warn!(
                    "#include loop detected while resolving {root}: {} ...",
                    pending_preview(&queue, &name)
                );
                truncated = true;
                break 'relax;
            }

            let grew = match depths.get(child) {
                Some(&d) if d >= child_depth => false,
                _ => {
                    depths.insert(child.clone(), child_depth);
                    true
                }
            };

            let needs_visit = !resolved_set.contains(child) || grew;
            if needs_visit && queued.insert(child.clone()) {
                queue.push_back((child.clone(), child_depth));
            }
        }
    }

    resolved.retain(|k| k != root);
    // Stable: equal depths keep discovery order.
    resolved.sort_by(|a, b| depths[b].cmp(&depths[a]));

    Closure {
        order: resolved,
        depths,
        truncated,
    }
}

/// Ranks the closure of every module that has a dependency entry.
#[must_use]
pub fn resolve_all(deps: &DependencyMap, options: &LoaderOptions) -> FxHashMap<ModuleKey, Closure> {
    deps.keys()
        .map(|root| (root.clone(), resolve_closure(deps, root, options)))
        .collect()
}

fn pending_preview(queue: &VecDeque<(ModuleKey, usize)>, current: &ModuleKey) -> String {
    std::iter::once(current)
        .chain(queue.iter().map(|(k, _)| k))
        .take(10)
        .map(ModuleKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> DependencyMap {
        edges
            .iter()
            .map(|(k, v)| {
                (
                    ModuleKey::from_canonical(*k),
                    v.iter().map(|d| ModuleKey::from_canonical(*d)).collect(),
                )
            })
            .collect()
    }

    fn order(closure: &Closure) -> Vec<&str> {
        closure.order.iter().map(ModuleKey::as_str).collect()
    }

    #[test]
    fn test_chain_deepest_first() {
        let deps = graph(&[("root", &["a"]), ("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let closure = resolve_closure(&deps, &ModuleKey::from_canonical("root"), &LoaderOptions::default());
        assert_eq!(order(&closure), vec!["c", "b", "a"]);
        assert!(!closure.truncated);
    }

    #[test]
    fn test_diamond_relaxes_shared_include() {
        // root -> a, c; c -> a; a -> b
        let deps = graph(&[("root", &["a", "c"]), ("c", &["a"]), ("a", &["b"]), ("b", &[])]);
        let closure = resolve_closure(&deps, &ModuleKey::from_canonical("root"), &LoaderOptions::default());
        assert_eq!(order(&closure), vec!["b", "a", "c"]);
        assert_eq!(closure.depth("a"), Some(1));
        assert_eq!(closure.depth("b"), Some(2));
    }

    #[test]
    fn test_duplicate_includes_resolved_once() {
        let deps = graph(&[("root", &["a", "a", "b"]), ("b", &["a"])]);
        let closure = resolve_closure(&deps, &ModuleKey::from_canonical("root"), &LoaderOptions::default());
        assert_eq!(order(&closure), vec!["a", "b"]);
    }

    #[test]
    fn test_no_includes_gives_empty_closure() {
        let deps = graph(&[("root", &[])]);
        let closure = resolve_closure(&deps, &ModuleKey::from_canonical("root"), &LoaderOptions::default());
        assert!(closure.order.is_empty());
    }

    #[test]
    fn test_mutual_include_terminates() {
        let deps = graph(&[("a", &["b"]), ("b", &["a"])]);
        let closure = resolve_closure(&deps, &ModuleKey::from_canonical("a"), &LoaderOptions::default());
        assert!(closure.truncated);
        assert_eq!(order(&closure), vec!["b"]);
    }

    #[test]
    fn test_depth_revisits_do_not_spend_budget() {
        // `common` has 60 leaf includes and is reached by chains of every
        // length from 1 to 20, so its subtree is revisited once per length.
        let mut deps = DependencyMap::default();
        let key = |s: String| ModuleKey::from_canonical(s);

        let leaves: Vec<ModuleKey> = (0..60).map(|i| key(format!("leaf{i}"))).collect();
        for leaf in &leaves {
            deps.insert(leaf.clone(), Vec::new());
        }
        deps.insert(key("common".into()), leaves);

        let mut heads = Vec::new();
        for len in 1..=20 {
            for step in 0..len {
                let next = if step + 1 == len {
                    key("common".into())
                } else {
                    key(format!("chain{len}_{}", step + 1))
                };
                deps.insert(key(format!("chain{len}_{step}")), vec![next]);
            }
            heads.push(key(format!("chain{len}_0")));
        }
        deps.insert(key("root".into()), heads);

        let edges: usize = deps
            .iter()
            .filter(|(k, _)| k.as_str() != "root")
            .map(|(_, v)| v.len())
            .sum();
        assert_eq!(edges, 270);

        let closure = resolve_closure(&deps, &key("root".into()), &LoaderOptions::default());

        assert!(!closure.truncated);
        assert_eq!(closure.order.len(), 271);
        assert_eq!(closure.depth("common"), Some(20));
        assert_eq!(closure.depth("leaf0"), Some(21));
        let position = |name: &str| closure.order.iter().position(|k| k.as_str() == name).unwrap();
        assert!(position("leaf59") < position("common"));
        assert!(position("common") < position("chain20_19"));
    }

    #[test]
    fn test_iteration_budget_truncates() {
        let deps = graph(&[("root", &["a", "b", "c"]), ("a", &["b"]), ("b", &["c"])]);
        let options = LoaderOptions {
            max_include_iterations: 1,
            ..LoaderOptions::default()
        };
        let closure = resolve_closure(&deps, &ModuleKey::from_canonical("root"), &options);
        assert!(closure.truncated);
        assert!(closure.contains("a"));
    }
}
