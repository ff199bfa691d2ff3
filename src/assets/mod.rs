pub mod fetch;
pub mod io;
pub mod loader;
pub mod storage;

// Re-export the loader and related types
pub use fetch::{FetchResults, FetchTask};
pub use io::{
    FileSourceReader, MemorySourceReader, SourceReader, SourceReaderVariant,
};
#[cfg(feature = "http")]
pub use io::HttpSourceReader;
pub use loader::ShaderLoader;
pub use storage::{ShaderCache, SourceStorage};
