//! GLSL shader loading for the Myth engine.
//!
//! Fetches shader modules from a directory or an HTTP root, resolves their
//! `#include <...>` directives into a single source per module, and hands the
//! result back as a path-addressable [`ShaderStore`].
//!
//! ```rust,ignore
//! use myth_shaders::ShaderLoader;
//!
//! let loader = ShaderLoader::new();
//! loader.load(["water_fragment", "generic_vertex"], |shaders, ok| {
//!     if ok {
//!         let fragment = shaders.path("water_fragment");
//!     }
//! });
//! ```

pub mod assets;
pub mod errors;
pub mod key;
pub mod options;
pub mod preprocess;
pub mod store;

pub use assets::{ShaderCache, ShaderLoader, SourceReaderVariant};
pub use errors::{Error, Result};
pub use key::{ModuleKey, normalize};
pub use options::{LoaderConfig, LoaderOptions, TypePostfix};
pub use preprocess::Preprocessor;
pub use store::ShaderStore;
