use std::path::PathBuf;
use std::time::Duration;

/// Transfers that reach this many bytes are rejected.
pub const DEFAULT_MAX_TRANSFER_BYTES: u64 = 4096;
pub const DEFAULT_CACHE_DIRECTORY: &str = "cache";
pub const DEFAULT_CACHE_EXTENSION: &str = "png";

pub struct RuntimeConfig {
    pub tokio: TokioConfig,
    pub http: HttpConfig,
    pub cache: FileCacheConfig,
    pub init_logging: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TokioConfig {
    pub worker_threads: Option<usize>,
    pub thread_stack_size: Option<usize>,
    pub thread_name_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Overall deadline for one transfer. `None` leaves the size cap as the only bound.
    pub request_timeout: Option<Duration>,
    pub pool_idle_timeout: Duration,
    pub max_connections_per_host: usize,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileCacheConfig {
    pub root: PathBuf,
    pub directory_name: String,
    pub extension: String,
    pub max_transfer_bytes: u64,
}

impl FileCacheConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.directory_name)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            pool_idle_timeout: Duration::from_secs(90),
            max_connections_per_host: 100,
            user_agent: None,
        }
    }
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            directory_name: DEFAULT_CACHE_DIRECTORY.to_string(),
            extension: DEFAULT_CACHE_EXTENSION.to_string(),
            max_transfer_bytes: DEFAULT_MAX_TRANSFER_BYTES,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tokio: TokioConfig::default(),
            http: HttpConfig::default(),
            cache: FileCacheConfig::default(),
            init_logging: false,
        }
    }
}
