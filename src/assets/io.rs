use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{Error, Result};

/// Source reader trait
/// Asynchronous text reads from local files or network resources
pub trait SourceReader: Send + Sync {
    /// Reads the text behind `uri`, resolved against the reader root.
    fn read_text(&self, uri: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Local file reader
pub struct FileSourceReader {
    root_path: PathBuf,
}

impl FileSourceReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl SourceReader for FileSourceReader {
    async fn read_text(&self, uri: &str) -> Result<String> {
        let path = self.root_path.join(uri);
        let text = tokio::fs::read_to_string(&path).await?;
        Ok(text)
    }
}

/// HTTP reader (conditional compilation)
#[cfg(feature = "http")]
pub struct HttpSourceReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpSourceReader {
    pub fn new(url_str: &str) -> Result<Self> {
        let url = url::Url::parse(url_str)?;
        let root_url = if url.path().ends_with('/') {
            url
        } else {
            let mut u = url.clone();
            if let Ok(mut segments) = u.path_segments_mut() {
                segments.pop();
                segments.push("");
            }
            u
        };

        Ok(Self { root_url })
    }

    #[inline]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl SourceReader for HttpSourceReader {
    async fn read_text(&self, uri: &str) -> Result<String> {
        let url = self.root_url.join(uri)?;
        let resp = ehttp::fetch_async(ehttp::Request::get(url.as_str()))
            .await
            .map_err(Error::HttpError)?;
        if !resp.ok {
            return Err(Error::HttpResponseError {
                status: resp.status,
            });
        }
        resp.text()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidUtf8(url.to_string()))
    }
}

/// In-memory reader keyed by URI.
///
/// Counts every request it serves, hit or miss.
#[derive(Default)]
pub struct MemorySourceReader {
    sources: RwLock<FxHashMap<String, String>>,
    requests: RwLock<FxHashMap<String, usize>>,
}

impl MemorySourceReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_source(self, uri: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(uri, text);
        self
    }

    pub fn insert(&self, uri: impl Into<String>, text: impl Into<String>) {
        self.sources.write().insert(uri.into(), text.into());
    }

    /// Number of reads issued for `uri` so far.
    pub fn request_count(&self, uri: &str) -> usize {
        self.requests.read().get(uri).copied().unwrap_or(0)
    }

    /// Number of reads issued for all URIs so far.
    pub fn total_requests(&self) -> usize {
        self.requests.read().values().sum()
    }
}

impl SourceReader for MemorySourceReader {
    async fn read_text(&self, uri: &str) -> Result<String> {
        *self.requests.write().entry(uri.to_string()).or_insert(0) += 1;
        self.sources
            .read()
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::SourceNotFound(uri.to_string()))
    }
}

/// Source reader variant enum
/// Avoids trait object runtime overhead
#[derive(Clone)]
pub enum SourceReaderVariant {
    File(Arc<FileSourceReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpSourceReader>),
    Memory(Arc<MemorySourceReader>),
}

impl Default for SourceReaderVariant {
    fn default() -> Self {
        Self::File(Arc::new(FileSourceReader::new(".")))
    }
}

impl SourceReaderVariant {
    /// Automatically creates the appropriate reader from a path or URL
    pub fn from_source(source: &str) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpSourceReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(Error::FeatureNotEnabled(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`"
                        .to_string(),
                ))
            }
        } else {
            Ok(Self::File(Arc::new(FileSourceReader::new(source))))
        }
    }

    /// Asynchronously reads text data
    pub async fn read_text(&self, uri: &str) -> Result<String> {
        match self {
            Self::File(r) => r.read_text(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_text(uri).await,
            Self::Memory(r) => r.read_text(uri).await,
        }
    }
}

impl From<Arc<MemorySourceReader>> for SourceReaderVariant {
    fn from(reader: Arc<MemorySourceReader>) -> Self {
        Self::Memory(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reader_counts_requests() {
        let reader = MemorySourceReader::new().with_source("shaders/common.glsl", "float x;");
        let text = pollster::block_on(reader.read_text("shaders/common.glsl")).unwrap();
        assert_eq!(text, "float x;");
        assert!(pollster::block_on(reader.read_text("shaders/none.glsl")).is_err());
        assert_eq!(reader.request_count("shaders/common.glsl"), 1);
        assert_eq!(reader.request_count("shaders/none.glsl"), 1);
        assert_eq!(reader.total_requests(), 2);
    }

    #[test]
    fn test_from_source_picks_file_reader() {
        let reader = SourceReaderVariant::from_source("assets").unwrap();
        assert!(matches!(reader, SourceReaderVariant::File(_)));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_root_url_keeps_directory() {
        let reader = HttpSourceReader::new("https://example.com/app/index.html").unwrap();
        assert_eq!(reader.root_url().as_str(), "https://example.com/app/");
    }
}
