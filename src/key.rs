//! Module Keys
//!
//! Canonical identifiers for shader modules and the two conversions built on
//! them:
//!
//! - [`normalize`]: reference (`lighting/phong_fragment.glsl`, `#include <common>`)
//!   → canonical key (`lighting_fragment_phong`, `common`)
//! - [`ModuleKey::path_segments`]: canonical key → file path segments
//!   (`["lighting", "phong_fragment"]`), used for URIs and the shader store.
//!
//! The type postfix swap in `normalize` and its reversal in `path_segments`
//! are the only place segment order is decided.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::options::LoaderOptions;

type Segments<'a> = SmallVec<[&'a str; 8]>;

/// Canonical shader module identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey(Arc<str>);

impl ModuleKey {
    /// Wraps an already-canonical key without normalizing it.
    #[inline]
    #[must_use]
    pub fn from_canonical(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File path segments of this module, with a trailing `type_name` pair
    /// folded back into a single `name_type` segment.
    #[must_use]
    pub fn path_segments(&self, options: &LoaderOptions) -> Vec<String> {
        let parts: Segments = self.0.split('_').collect();
        let n = parts.len();
        let postfix = &options.type_postfix;

        if n >= 2 && postfix.matches(parts[n - 2]) && !postfix.matches(parts[n - 1]) {
            let mut segments: Vec<String> = parts[..n - 2].iter().map(|s| (*s).to_string()).collect();
            segments.push(format!("{}_{}", parts[n - 1], parts[n - 2]));
            segments
        } else {
            parts.iter().map(|s| (*s).to_string()).collect()
        }
    }

    /// Location of this module's source relative to the reader root.
    #[must_use]
    pub fn uri(&self, options: &LoaderOptions) -> String {
        format!(
            "{}{}{}",
            options.shaders_path,
            self.path_segments(options).join("/"),
            options.shader_file_extension
        )
    }
}

impl fmt::Debug for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleKey({:?})", &*self.0)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModuleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModuleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalizes a module reference.
///
/// Accepts bare names, slash paths and full include directives. Pure and
/// idempotent: `normalize(normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(reference: &str, options: &LoaderOptions) -> ModuleKey {
    let inner = options.include_target(reference).unwrap_or(reference).trim();

    let mut stem = inner;
    let ext = options.shader_file_extension.as_str();
    if !ext.is_empty() {
        while let Some(stripped) = stem.strip_suffix(ext) {
            stem = stripped;
        }
    }

    let mut parts: Segments = stem
        .split('/')
        .flat_map(|piece| piece.split('_'))
        .filter(|segment| !segment.is_empty())
        .collect();

    let n = parts.len();
    let postfix = &options.type_postfix;
    if n > 1 && postfix.matches(parts[n - 1]) && !postfix.matches(parts[n - 2]) {
        parts.swap(n - 1, n - 2);
    }

    ModuleKey(parts.join("_").into())
}

/// Normalizes every reference, dropping duplicates while keeping first-seen order.
#[must_use]
pub fn normalize_all<I, S>(references: I, options: &LoaderOptions) -> Vec<ModuleKey>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys: Vec<ModuleKey> = Vec::new();
    for reference in references {
        let key = normalize(reference.as_ref(), options);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
