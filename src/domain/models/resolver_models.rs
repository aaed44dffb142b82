use crate::domain::models::file_cache_models::CacheError;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Terminal result of resolving a path or URL: a local file that existed when it was produced,
/// or a typed failure.
pub type ResolutionOutcome = Result<PathBuf, ResolveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveErrorKind {
    /// No regular file at the requested filesystem path.
    NotFound,
    /// The remote payload reached the configured transfer cap.
    PayloadTooLarge,
    /// Network or file IO failed while downloading.
    TransferFailed,
    /// Anything the user cannot act on, e.g. an uncreatable cache directory.
    Internal,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub message: String,
    #[source]
    pub cause: Option<Arc<dyn Error + Send + Sync + 'static>>,
}

impl ResolveErrorKind {
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ResolveErrorKind::Internal)
    }
}

impl fmt::Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolveErrorKind::NotFound => "not found",
            ResolveErrorKind::PayloadTooLarge => "payload too large",
            ResolveErrorKind::TransferFailed => "transfer failed",
            ResolveErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(
            ResolveErrorKind::NotFound,
            format!("Could not find the specified file: '{}'.", path),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ResolveErrorKind::Internal, message)
    }
}

impl PartialEq for ResolveError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl From<CacheError> for ResolveError {
    fn from(err: CacheError) -> Self {
        let (kind, message) = match &err {
            CacheError::TooLarge { .. } => (
                ResolveErrorKind::PayloadTooLarge,
                "The file at the specified URL was too large to download.",
            ),
            CacheError::Transfer(_) | CacheError::Io { .. } => (
                ResolveErrorKind::TransferFailed,
                "Could not download the file from the specified URL.",
            ),
            CacheError::Directory { .. } => (
                ResolveErrorKind::Internal,
                "An error occurred while preparing the download cache.",
            ),
        };

        ResolveError::new(kind, message).with_cause(err)
    }
}
