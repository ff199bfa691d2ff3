//! Loader Configuration
//!
//! [`LoaderOptions`] holds the compiled patterns and path conventions shared by
//! the normalizer, the fetch task, the preprocessor and the shader store.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_shaders::LoaderOptions;
//!
//! // Defaults: `#include <path>`, vertex/fragment postfixes, `shaders/*.glsl`
//! let options = LoaderOptions::default();
//!
//! // Overrides from a JSON document
//! let options = LoaderOptions::from_json(r#"{ "shaders_path": "assets/glsl/" }"#)?;
//! ```

use regex::Regex;
use serde::Deserialize;
use smallvec::{SmallVec, smallvec};

use crate::errors::Result;

pub const DEFAULT_INCLUDE_SYNTAX: &str = r"^\s*#include\s*<(.*)>\s*$";
pub const DEFAULT_TYPE_POSTFIX: &str = "^(vertex|fragment)$";
pub const DEFAULT_SHADER_FILE_EXTENSION: &str = ".glsl";
pub const DEFAULT_SHADERS_PATH: &str = "shaders/";
pub const DEFAULT_MAX_INCLUDE_ITERATIONS: usize = 1000;
pub const DEFAULT_MAX_RETRIES: usize = 32;

// ---------------------------------------------------------------------------
// TypePostfix
// ---------------------------------------------------------------------------

/// Recognizes the shader-stage segment of a module name (`vertex`, `fragment`).
///
/// A segment counts as a postfix only if it matches the pattern **and** is one
/// of the listed names.
#[derive(Debug, Clone)]
pub struct TypePostfix {
    pattern: Regex,
    names: SmallVec<[String; 2]>,
}

impl TypePostfix {
    pub fn new(pattern: &str, names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            names: names.into_iter().map(Into::into).collect(),
        })
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, segment: &str) -> bool {
        self.pattern.is_match(segment) && self.names.iter().any(|n| n == segment)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for TypePostfix {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_TYPE_POSTFIX).expect("default type postfix pattern is valid"),
            names: smallvec!["vertex".to_string(), "fragment".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// LoaderOptions
// ---------------------------------------------------------------------------

/// Compiled loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Recognizes an include directive line; capture group 1 is the referenced path.
    pub include_syntax: Regex,
    pub type_postfix: TypePostfix,
    /// Appended to derived URIs and stripped from inbound references.
    pub shader_file_extension: String,
    /// Prefix of every derived URI.
    pub shaders_path: String,
    /// Edge budget of one closure traversal before it is treated as an include cycle.
    pub max_include_iterations: usize,
    /// Maximum number of extra fetch rounds for discovered includes.
    pub max_retries: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            include_syntax: Regex::new(DEFAULT_INCLUDE_SYNTAX)
                .expect("default include pattern is valid"),
            type_postfix: TypePostfix::default(),
            shader_file_extension: DEFAULT_SHADER_FILE_EXTENSION.to_string(),
            shaders_path: DEFAULT_SHADERS_PATH.to_string(),
            max_include_iterations: DEFAULT_MAX_INCLUDE_ITERATIONS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl LoaderOptions {
    /// Parses a JSON [`LoaderConfig`] document and compiles it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LoaderConfig = serde_json::from_str(json)?;
        config.build()
    }

    /// Returns the referenced path if `line` is an include directive.
    #[inline]
    #[must_use]
    pub fn include_target<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.include_syntax
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    #[inline]
    #[must_use]
    pub fn is_include(&self, line: &str) -> bool {
        self.include_syntax.is_match(line)
    }
}

// ---------------------------------------------------------------------------
// LoaderConfig
// ---------------------------------------------------------------------------

/// Serializable form of [`LoaderOptions`], every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub include_syntax: Option<String>,
    pub type_postfix: Option<String>,
    pub type_names: Option<Vec<String>>,
    #[serde(alias = "shader_file_extention")]
    pub shader_file_extension: Option<String>,
    pub shaders_path: Option<String>,
    pub max_include_iterations: Option<usize>,
    pub max_retries: Option<usize>,
}

impl LoaderConfig {
    pub fn build(self) -> Result<LoaderOptions> {
        let mut options = LoaderOptions::default();

        if let Some(pattern) = self.include_syntax {
            options.include_syntax = Regex::new(&pattern)?;
        }
        if self.type_postfix.is_some() || self.type_names.is_some() {
            let pattern = self.type_postfix.as_deref().unwrap_or(DEFAULT_TYPE_POSTFIX);
            let names = self
                .type_names
                .unwrap_or_else(|| options.type_postfix.names().to_vec());
            options.type_postfix = TypePostfix::new(pattern, names)?;
        }
        if let Some(ext) = self.shader_file_extension {
            options.shader_file_extension = ext;
        }
        if let Some(path) = self.shaders_path {
            options.shaders_path = path;
        }
        if let Some(n) = self.max_include_iterations {
            options.max_include_iterations = n;
        }
        if let Some(n) = self.max_retries {
            options.max_retries = n;
        }

        Ok(options)
    }
}
