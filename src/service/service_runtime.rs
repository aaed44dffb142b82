use crate::domain::models::resolver_models::ResolutionOutcome;
use crate::domain::traits::http_traits::HttpClient;
use crate::infrastructure::file_cache::file_cache_backend::DownloadCache;
use crate::infrastructure::http::reqwest_backend::ReqwestBackend;
use crate::service::config::{HttpConfig, RuntimeConfig, TokioConfig};
use crate::service::resolver::{PathResolver, PendingResolution};
use crate::utils::logging::{DEFAULT_FILTER, init_logging};
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Tokio runtime initialization failed: {0}")]
    TokioInit(String),
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub struct ServiceRuntime {
    tokio_runtime: Option<Runtime>,
    handle: Handle,
    cache: Arc<DownloadCache>,
    resolver: PathResolver,
}

impl ServiceRuntime {
    /// Builds a runtime that owns its own multi-threaded tokio runtime.
    pub fn initialize(config: RuntimeConfig) -> Result<Arc<Self>, InitError> {
        let tokio_runtime = Self::create_tokio_runtime(&config.tokio)?;
        let handle = tokio_runtime.handle().clone();
        Self::assemble(config, Some(tokio_runtime), handle)
    }

    /// Builds a runtime that schedules downloads on a runtime owned by the host.
    pub fn with_handle(config: RuntimeConfig, handle: Handle) -> Result<Arc<Self>, InitError> {
        Self::assemble(config, None, handle)
    }

    fn assemble(
        config: RuntimeConfig,
        tokio_runtime: Option<Runtime>,
        handle: Handle,
    ) -> Result<Arc<Self>, InitError> {
        if config.init_logging {
            if let Err(e) = init_logging(DEFAULT_FILTER) {
                tracing::debug!("keeping the existing log subscriber: {}", e);
            }
        }
        if config.cache.directory_name.is_empty() {
            return Err(InitError::Configuration(
                "cache directory name must not be empty".to_string(),
            ));
        }

        let http_client = Self::create_http_client(config.http)?;
        tracing::debug!(
            "cache directory {} with a {} byte transfer limit",
            config.cache.cache_dir().display(),
            config.cache.max_transfer_bytes
        );

        let cache = Arc::new(DownloadCache::new(config.cache, http_client));
        let resolver = PathResolver::new(cache.clone(), handle.clone());

        Ok(Arc::new(Self {
            tokio_runtime,
            handle,
            cache,
            resolver,
        }))
    }

    pub fn resolve(&self, path: &str) -> PendingResolution {
        self.resolver.resolve(path)
    }

    /// Blocks the calling thread until `path` is resolved. Must not be called from async code.
    pub fn resolve_blocking(&self, path: &str) -> ResolutionOutcome {
        self.handle.block_on(self.resolve(path))
    }

    pub fn cache(&self) -> &Arc<DownloadCache> {
        &self.cache
    }

    fn create_tokio_runtime(tokio_config: &TokioConfig) -> Result<Runtime, InitError> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();

        if let Some(threads) = tokio_config.worker_threads {
            builder.worker_threads(threads);
        }
        if let Some(stack_size) = tokio_config.thread_stack_size {
            builder.thread_stack_size(stack_size);
        }
        if let Some(prefix) = &tokio_config.thread_name_prefix {
            builder.thread_name(prefix);
        }

        builder
            .enable_all()
            .build()
            .map_err(|e| InitError::TokioInit(e.to_string()))
    }

    fn create_http_client(http_config: HttpConfig) -> Result<Arc<dyn HttpClient>, InitError> {
        let backend = ReqwestBackend::with_config(http_config)
            .map_err(|e| InitError::HttpClientInit(e.to_string()))?;

        Ok(Arc::new(backend))
    }
}

impl Drop for ServiceRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.tokio_runtime.take() {
            runtime.shutdown_background();
        }
    }
}
