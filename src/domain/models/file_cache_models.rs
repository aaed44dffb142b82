use crate::domain::models::http_models::HttpClientError;
use md5::{Digest, Md5};
use std::path::PathBuf;

/// Content-derived name of a cache entry: uppercase hex md5 of the canonical URL plus a fixed
/// extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub digest: String,
    pub extension: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cannot create cache directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO Error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Transfer failed: {0}")]
    Transfer(#[from] HttpClientError),
    #[error("Transfer reached the {limit} byte limit after {received} bytes")]
    TooLarge { limit: u64, received: u64 },
}

impl CacheKey {
    pub fn derive(canonical_url: &str, extension: &str) -> Self {
        let digest = Md5::digest(canonical_url.as_bytes());
        Self {
            digest: hex::encode_upper(digest),
            extension: extension.to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            return self.digest.clone();
        }
        format!("{}.{}", self.digest, self.extension)
    }
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
