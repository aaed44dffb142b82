use crate::domain::models::resolver_models::{ResolutionOutcome, ResolveError};
use crate::domain::traits::file_cache_traits::FileCache;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use url::Url;

/// Shared handle to one computation. Every clone yields the same outcome.
pub type PendingResolution = Shared<BoxFuture<'static, ResolutionOutcome>>;

/// Deduplicates resolutions of file paths and URLs.
///
/// The table keeps one computation per request string. Pending and successful entries are
/// handed out again; a failed entry is replaced by a new computation on the next request.
pub struct PathResolver {
    cache: Arc<dyn FileCache>,
    handle: Handle,
    pending: DashMap<String, TableEntry>,
}

struct TableEntry {
    resolution: PendingResolution,
    failed: Arc<AtomicBool>,
}

/// Flags the entry as failed when dropped, unless the computation succeeded first.
/// Travels with the spawned task, so a panic or an abort also counts as a failure.
struct FailureMark {
    failed: Arc<AtomicBool>,
    succeeded: bool,
}

impl Drop for FailureMark {
    fn drop(&mut self) {
        if !self.succeeded {
            self.failed.store(true, Ordering::SeqCst);
        }
    }
}

enum Request {
    File(PathBuf),
    Remote(Url),
}

impl TableEntry {
    fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst) || matches!(self.resolution.peek(), Some(Err(_)))
    }
}

impl PathResolver {
    pub fn new(cache: Arc<dyn FileCache>, handle: Handle) -> Self {
        Self {
            cache,
            handle,
            pending: DashMap::new(),
        }
    }

    /// Resolves `path` to a local file, downloading it first when it is a URL.
    ///
    /// The returned future does not need to be polled for the work to progress: remote
    /// transfers run as tasks on the configured runtime, filesystem paths are checked
    /// before this returns.
    pub fn resolve(&self, path: &str) -> PendingResolution {
        match self.pending.entry(path.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().has_failed() {
                    tracing::debug!("previous resolution of {} failed, starting over", path);
                    let computation = self.compute(path);
                    let resolution = computation.resolution.clone();
                    entry.insert(computation);
                    return resolution;
                }
                entry.get().resolution.clone()
            }
            Entry::Vacant(entry) => {
                let computation = self.compute(path);
                let resolution = computation.resolution.clone();
                entry.insert(computation);
                resolution
            }
        }
    }

    /// Drops the table entry for `path`. Callers already holding its future are unaffected.
    pub fn forget(&self, path: &str) -> bool {
        self.pending.remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn classify(raw: &str) -> Request {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(_) => return Request::File(PathBuf::from(raw)),
        };

        // one-letter schemes are drive letters, e.g. C:\skins\steve.png
        if url.scheme().len() == 1 {
            return Request::File(PathBuf::from(raw));
        }
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return Request::File(path);
            }
        }
        Request::Remote(url)
    }

    fn compute(&self, raw: &str) -> TableEntry {
        match Self::classify(raw) {
            Request::File(path) => {
                let outcome = Self::check_file(raw, &path);
                TableEntry {
                    failed: Arc::new(AtomicBool::new(outcome.is_err())),
                    resolution: futures_util::future::ready(outcome).boxed().shared(),
                }
            }
            Request::Remote(url) => {
                let failed = Arc::new(AtomicBool::new(false));
                let mut mark = FailureMark {
                    failed: failed.clone(),
                    succeeded: false,
                };
                let cache = Arc::clone(&self.cache);
                let task = self.handle.spawn(async move {
                    let _ = &mark;
                    let outcome = cache.fetch(&url).await.map_err(ResolveError::from);
                    mark.succeeded = outcome.is_ok();
                    outcome
                });

                let resolution = async move {
                    match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(ResolveError::internal(
                            "The download was interrupted before it completed.",
                        )
                        .with_cause(e)),
                    }
                }
                .boxed()
                .shared();

                TableEntry { resolution, failed }
            }
        }
    }

    fn check_file(raw: &str, path: &Path) -> ResolutionOutcome {
        if path.is_file() {
            Ok(std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
        } else {
            Err(ResolveError::not_found(raw))
        }
    }
}
