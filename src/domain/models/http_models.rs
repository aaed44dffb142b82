use bytes::Bytes;
use futures_util::stream::BoxStream;
use std::time::Duration;

/// Body of an opened transfer, yielded chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, HttpClientError>>;

pub struct HttpDownload {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HttpDownload {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
