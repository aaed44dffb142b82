use crate::domain::models::http_models::{HttpClientError, HttpDownload};
use async_trait::async_trait;
use url::Url;

#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Opens `url` for reading. The body is not consumed until the returned stream is polled.
    async fn open(&self, url: &Url) -> Result<HttpDownload, HttpClientError>;
}
