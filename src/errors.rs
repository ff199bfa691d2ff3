//! Error Types
//!
//! This module defines the error types used throughout the shader loader.
//!
//! # Overview
//!
//! The main error type [`Error`] covers all failure modes including:
//! - Shader source retrieval failures (file, HTTP, in-memory)
//! - Include resolution failures
//! - Configuration and pattern errors
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, Error>`.
//!
//! ```rust,ignore
//! use myth_shaders::errors::{Error, Result};
//!
//! async fn load(loader: &ShaderLoader) -> Result<()> {
//!     let store = loader.load_async(["phong_fragment"]).await?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for shader loading.
///
/// Each variant provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Shader Loading Errors
    // ========================================================================
    /// One or more shader sources of a batch could not be retrieved.
    #[error("Some shader files failed to load: {}", .keys.join(", "))]
    FetchFailed {
        /// Canonical keys of every module that failed in the batch
        keys: Vec<String>,
    },

    /// An include names a module that was already requested and still cannot be found.
    #[error("Shader includes not found: {}", .modules.join(", "))]
    UnresolvedInclude {
        /// Canonical keys of the unresolvable includes
        modules: Vec<String>,
    },

    /// The include closure kept growing past the configured number of retry rounds.
    #[error("Include retry limit exceeded after {rounds} rounds (still missing: {})", .missing.join(", "))]
    RetryLimitExceeded {
        /// Number of fetch rounds performed
        rounds: usize,
        /// Includes that were still missing after the last round
        missing: Vec<String>,
    },

    // ========================================================================
    // Source Reader Errors
    // ========================================================================
    /// The requested source does not exist in the reader.
    #[error("Shader source not found: {0}")]
    SourceNotFound(String),

    /// The reader returned an empty body.
    #[error("Empty shader source: {0}")]
    EmptySource(String),

    /// The source bytes are not valid UTF-8.
    #[error("Shader source is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // HTTP & Network Errors
    // ========================================================================
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// URL parsing error.
    #[cfg(feature = "http")]
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// HTTP response error with status code.
    #[error("HTTP response error: status {status}")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A configured pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP source requested without the `http` feature.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
