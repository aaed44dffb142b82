use crate::domain::models::file_cache_models::{CacheError, CacheKey};
use async_trait::async_trait;
use std::path::PathBuf;
use url::Url;

#[async_trait]
pub trait FileCache: Send + Sync + 'static {
    /// Returns a local file holding the content of `url`, downloading it on a cache miss.
    async fn fetch(&self, url: &Url) -> Result<PathBuf, CacheError>;

    fn key(&self, url: &Url) -> CacheKey;
    fn path(&self, key: &CacheKey) -> PathBuf;
}
