//! Byte fetching capability consumed by the resolver
//!
//! The resolver only needs "give me the bytes at this URL within this
//! timeout". [`FetchClient`] is that seam; [`HttpFetchClient`] implements it
//! with reqwest for server deployments, and tests inject their own stubs.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, header::CONTENT_TYPE, redirect::Policy};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ResolverConfig;
use crate::errors::{AppResult, FetchError, FetchResult};

/// A successful fetch: non-empty body from a 2xx response
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBytes {
    pub bytes: Bytes,
    /// Upstream `Content-Type`, if any
    pub content_type: Option<String>,
    /// URL after redirects
    pub final_url: String,
}

impl FetchedBytes {
    pub fn new(bytes: impl Into<Bytes>, final_url: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
            final_url: final_url.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Fetch raw bytes from a URL within a timeout
///
/// Implementations must treat non-2xx statuses and empty bodies as failures;
/// the resolver relies on `Ok` meaning "usable bytes".
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedBytes>;
}

/// reqwest-backed fetch client
///
/// Redirects are followed up to the configured limit inside the same
/// per-attempt timeout. Bodies are read incrementally and abandoned once they
/// pass `max_body_bytes`.
#[derive(Debug, Clone)]
pub struct HttpFetchClient {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetchClient {
    pub fn new(config: &ResolverConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn too_large(&self, url: &str) -> FetchError {
        FetchError::BodyTooLarge {
            url: url.to_string(),
            limit: self.max_body_bytes,
        }
    }

    fn parse_candidate(url: &str) -> FetchResult<Url> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            _ => Err(FetchError::InvalidUrl {
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl FetchClient for HttpFetchClient {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedBytes> {
        let parsed = Self::parse_candidate(url)?;

        let mut response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let final_url = response.url().to_string();

        if response
            .content_length()
            .is_some_and(|length| length > self.max_body_bytes as u64)
        {
            return Err(self.too_large(url));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        debug!("Fetched {} bytes from {}", bytes.len(), final_url);

        Ok(FetchedBytes {
            bytes,
            content_type,
            final_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_unparseable_and_non_http_urls() {
        let client = HttpFetchClient::new(&ResolverConfig::default()).unwrap();

        for url in ["not a url", "ftp://example.com/favicon.ico", "data:image/png;base64,AA=="] {
            let result = client.fetch(url, Duration::from_secs(1)).await;
            assert_eq!(
                result,
                Err(FetchError::InvalidUrl {
                    url: url.to_string()
                })
            );
        }
    }
}
