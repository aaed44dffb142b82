use crate::domain::models::file_cache_models::{CacheError, CacheKey};
use crate::domain::models::http_models::HttpClientError;
use crate::domain::traits::file_cache_traits::FileCache;
use crate::domain::traits::http_traits::HttpClient;
use crate::service::config::FileCacheConfig;
use crate::utils::keyed_lock::KeyedLock;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, create_dir_all, metadata, rename};
use tokio::io::AsyncWriteExt;
use url::Url;
use uuid::Uuid;

/// Content-addressed download cache: `<root>/<directory_name>/<md5(url)>.<extension>`.
///
/// Entries are written to a temporary sibling and renamed into place once the whole body
/// arrived below the size cap, so a file at the entry path is always complete.
pub struct DownloadCache {
    config: FileCacheConfig,
    client: Arc<dyn HttpClient>,
    keys: KeyedLock,
}

/// Removes an unfinished download on drop unless it was committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("removed partial download {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "failed to remove partial download {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl DownloadCache {
    pub fn new(config: FileCacheConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            client,
            keys: KeyedLock::new(),
        }
    }

    async fn ensure_directory_exist(&self, directory: &Path) -> Result<(), CacheError> {
        create_dir_all(directory)
            .await
            .map_err(|source| CacheError::Directory {
                path: directory.to_path_buf(),
                source,
            })
    }

    async fn is_regular_file(path: &Path) -> bool {
        metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Streams `url` into `target`, returning the number of bytes written.
    async fn transfer(&self, url: &Url, target: &Path) -> Result<u64, CacheError> {
        let limit = self.config.max_transfer_bytes;
        let download = self.client.open(url).await?;

        if !download.is_success() {
            return Err(HttpClientError::Status(download.status).into());
        }
        if let Some(length) = download.content_length {
            if length >= limit {
                return Err(CacheError::TooLarge { limit, received: 0 });
            }
        }

        let mut file = File::create(target)
            .await
            .map_err(|e| CacheError::io(target, e))?;
        let mut body = download.body;
        let mut received: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            received += chunk.len() as u64;
            if received >= limit {
                return Err(CacheError::TooLarge { limit, received });
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| CacheError::io(target, e))?;
        }

        if received >= limit {
            return Err(CacheError::TooLarge { limit, received });
        }

        file.flush().await.map_err(|e| CacheError::io(target, e))?;
        file.sync_all()
            .await
            .map_err(|e| CacheError::io(target, e))?;

        Ok(received)
    }
}

#[async_trait]
impl FileCache for DownloadCache {
    async fn fetch(&self, url: &Url) -> Result<PathBuf, CacheError> {
        let key = self.key(url);
        let target = self.path(&key);

        // Different request strings can share a canonical URL, and with it the entry.
        let _guard = self.keys.lock(&key.file_name()).await;

        if Self::is_regular_file(&target).await {
            tracing::debug!("cache hit for {} at {}", url, target.display());
            return Ok(target);
        }

        let directory = self.config.cache_dir();
        self.ensure_directory_exist(&directory).await?;

        let mut partial = PartialFile::new(
            directory.join(format!("{}.{}.part", key.digest, Uuid::new_v4())),
        );

        tracing::info!("downloading {} to {}", url, target.display());

        let received = match self.transfer(url, &partial.path).await {
            Ok(received) => received,
            Err(CacheError::TooLarge { limit, received }) => {
                tracing::warn!(
                    "rejected {}: reached the {} byte limit ({} bytes received)",
                    url,
                    limit,
                    received
                );
                return Err(CacheError::TooLarge { limit, received });
            }
            Err(e) => return Err(e),
        };

        rename(&partial.path, &target)
            .await
            .map_err(|e| CacheError::io(&target, e))?;
        partial.committed = true;

        tracing::debug!("cached {} bytes of {} at {}", received, url, target.display());
        Ok(target)
    }

    fn key(&self, url: &Url) -> CacheKey {
        CacheKey::derive(url.as_str(), &self.config.extension)
    }

    fn path(&self, key: &CacheKey) -> PathBuf {
        self.config.cache_dir().join(key.file_name())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::DownloadCache;
    use crate::domain::models::file_cache_models::CacheError;
    use crate::domain::models::http_models::{HttpClientError, HttpDownload};
    use crate::domain::traits::file_cache_traits::FileCache;
    use crate::domain::traits::http_traits::HttpClient;
    use crate::service::config::FileCacheConfig;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::StreamExt;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    /// Serves canned chunks and counts how often a transfer was opened.
    pub(crate) struct FakeClient {
        pub status: u16,
        pub chunks: Vec<Vec<u8>>,
        pub content_length: Option<u64>,
        pub fail_after_chunks: bool,
        pub delay: Duration,
        pub opens: AtomicUsize,
    }

    impl FakeClient {
        pub(crate) fn serving(body: Vec<u8>) -> Self {
            Self {
                status: 200,
                chunks: vec![body],
                content_length: None,
                fail_after_chunks: false,
                delay: Duration::ZERO,
                opens: AtomicUsize::new(0),
            }
        }

        pub(crate) fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpClient for FakeClient {
        async fn open(&self, _url: &Url) -> Result<HttpDownload, HttpClientError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let mut items: Vec<Result<Bytes, HttpClientError>> = self
                .chunks
                .iter()
                .map(|chunk| Ok(Bytes::from(chunk.clone())))
                .collect();
            if self.fail_after_chunks {
                items.push(Err(HttpClientError::Network("connection reset".to_string())));
            }

            Ok(HttpDownload {
                status: self.status,
                content_length: self.content_length,
                body: futures_util::stream::iter(items).boxed(),
            })
        }
    }

    fn cache_with(root: &Path, client: Arc<FakeClient>) -> DownloadCache {
        DownloadCache::new(FileCacheConfig::with_root(root), client)
    }

    fn skin_url() -> Url {
        Url::parse("http://example.com/skin.png").unwrap()
    }

    fn entries(dir: &Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(read) => read.count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn test_miss_downloads_then_hits() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient::serving(vec![7u8; 200]));
        let cache = cache_with(root.path(), client.clone());

        let path = cache.fetch(&skin_url()).await.unwrap();
        assert_eq!(path, cache.path(&cache.key(&skin_url())));
        assert_eq!(std::fs::read(&path).unwrap().len(), 200);
        assert_eq!(path.extension().unwrap(), "png");

        let again = cache.fetch(&skin_url()).await.unwrap();
        assert_eq!(again, path);
        assert_eq!(client.opens(), 1);
        assert_eq!(entries(&root.path().join("cache")), 1);
    }

    #[tokio::test]
    async fn test_fresh_instance_reuses_directory() {
        let root = TempDir::new().unwrap();
        let first = Arc::new(FakeClient::serving(vec![1u8; 64]));
        let path = cache_with(root.path(), first.clone())
            .fetch(&skin_url())
            .await
            .unwrap();

        let second = Arc::new(FakeClient::serving(vec![2u8; 64]));
        let reused = cache_with(root.path(), second.clone())
            .fetch(&skin_url())
            .await
            .unwrap();

        assert_eq!(reused, path);
        assert_eq!(second.opens(), 0);
        assert_eq!(std::fs::read(&reused).unwrap(), vec![1u8; 64]);
    }

    #[tokio::test]
    async fn test_payload_at_limit_is_rejected() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient {
            chunks: vec![vec![0u8; 1024]; 4],
            ..FakeClient::serving(Vec::new())
        });
        let cache = cache_with(root.path(), client);

        let result = cache.fetch(&skin_url()).await;
        assert!(matches!(
            result,
            Err(CacheError::TooLarge {
                limit: 4096,
                received: 4096
            })
        ));
        assert!(!cache.path(&cache.key(&skin_url())).exists());
        assert_eq!(entries(&root.path().join("cache")), 0);
    }

    #[tokio::test]
    async fn test_payload_below_limit_is_kept() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient::serving(vec![3u8; 4095]));
        let cache = cache_with(root.path(), client);

        let path = cache.fetch(&skin_url()).await.unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len(), 4095);
    }

    #[tokio::test]
    async fn test_declared_length_rejected_before_body() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient {
            content_length: Some(1 << 20),
            ..FakeClient::serving(vec![0u8; 16])
        });
        let cache = cache_with(root.path(), client);

        let result = cache.fetch(&skin_url()).await;
        assert!(matches!(
            result,
            Err(CacheError::TooLarge { received: 0, .. })
        ));
        assert_eq!(entries(&root.path().join("cache")), 0);
    }

    #[tokio::test]
    async fn test_configurable_limit() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient::serving(vec![0u8; 10_000]));
        let config = FileCacheConfig {
            max_transfer_bytes: 65536,
            ..FileCacheConfig::with_root(root.path())
        };
        let cache = DownloadCache::new(config, client);

        assert!(cache.fetch(&skin_url()).await.is_ok());
    }

    #[tokio::test]
    async fn test_stream_error_leaves_no_file() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient {
            fail_after_chunks: true,
            ..FakeClient::serving(vec![5u8; 100])
        });
        let cache = cache_with(root.path(), client.clone());

        let result = cache.fetch(&skin_url()).await;
        assert!(matches!(
            result,
            Err(CacheError::Transfer(HttpClientError::Network(_)))
        ));
        assert_eq!(entries(&root.path().join("cache")), 0);

        // nothing is remembered, the next fetch opens a new transfer
        let _ = cache.fetch(&skin_url()).await;
        assert_eq!(client.opens(), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_transfer_failure() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient {
            status: 404,
            ..FakeClient::serving(b"not found".to_vec())
        });
        let cache = cache_with(root.path(), client);

        let result = cache.fetch(&skin_url()).await;
        assert!(matches!(
            result,
            Err(CacheError::Transfer(HttpClientError::Status(404)))
        ));
        assert!(!cache.path(&cache.key(&skin_url())).exists());
    }

    #[tokio::test]
    async fn test_uncreatable_directory() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let client = Arc::new(FakeClient::serving(vec![0u8; 8]));
        let cache = cache_with(&blocker, client.clone());

        let result = cache.fetch(&skin_url()).await;
        assert!(matches!(result, Err(CacheError::Directory { .. })));
        assert_eq!(client.opens(), 0);
    }

    #[tokio::test]
    async fn test_equivalent_urls_share_one_transfer() {
        let root = TempDir::new().unwrap();
        let client = Arc::new(FakeClient {
            delay: Duration::from_millis(50),
            ..FakeClient::serving(vec![9u8; 32])
        });
        let cache = Arc::new(cache_with(root.path(), client.clone()));

        let upper = Url::parse("HTTP://EXAMPLE.com/skin.png").unwrap();
        assert_eq!(cache.key(&upper), cache.key(&skin_url()));

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.fetch(&skin_url()).await })
        };
        let second = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.fetch(&upper).await })
        };

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(client.opens(), 1);
    }
}
