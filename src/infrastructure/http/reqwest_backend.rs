use crate::domain::models::http_models::{HttpClientError, HttpDownload};
use crate::domain::traits::http_traits::HttpClient;
use crate::service::config::HttpConfig;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub struct ReqwestBackend {
    client: Client,
    request_timeout: Option<Duration>,
}

impl ReqwestBackend {
    pub fn new() -> Result<Self, HttpClientError> {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Result<Self, HttpClientError> {
        let mut builder = Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_connections_per_host);

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|e| HttpClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
        })
    }

    fn convert_error(&self, e: reqwest::Error) -> HttpClientError {
        if e.is_timeout() {
            HttpClientError::Timeout(self.request_timeout.unwrap_or_default())
        } else {
            HttpClientError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestBackend {
    async fn open(&self, url: &Url) -> Result<HttpDownload, HttpClientError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpClientError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.convert_error(e))?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let timeout = self.request_timeout.unwrap_or_default();

        let body = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|e| {
                    if e.is_timeout() {
                        HttpClientError::Timeout(timeout)
                    } else {
                        HttpClientError::Network(e.to_string())
                    }
                })
            })
            .boxed();

        Ok(HttpDownload {
            status,
            content_length,
            body,
        })
    }
}
