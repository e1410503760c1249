//! Favicon endpoint URL generation
//!
//! Builds the query-string form of a resolution request. The same builder
//! produces the locally-hosted candidate URL in the source catalog and the
//! shareable API URLs handed out to callers.
//!
//! # Usage
//!
//! ```rust
//! use favicon_resolver::utils::api_url::FaviconUrlBuilder;
//!
//! let url = FaviconUrlBuilder::new("https://icons.example.net/favicon", "github.com")
//!     .size(64)
//!     .build();
//! assert_eq!(url, "https://icons.example.net/favicon?domain=github.com&size=64");
//! ```

use crate::models::{FallbackMode, ResolutionRequest};

/// Builder for favicon endpoint URLs
#[derive(Debug, Clone, PartialEq)]
pub struct FaviconUrlBuilder {
    endpoint: String,
    params: Vec<(&'static str, String)>,
}

impl FaviconUrlBuilder {
    /// Start a URL for `domain` against `endpoint`
    pub fn new(endpoint: impl Into<String>, domain: &str) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: vec![("domain", domain.to_string())],
        }
    }

    /// Full URL carrying every parameter of `request`
    ///
    /// `fallbackUrl` is only emitted when the request is in URL fallback mode.
    pub fn from_request(endpoint: impl Into<String>, request: &ResolutionRequest) -> Self {
        let mut builder = Self::new(endpoint, request.domain())
            .size(request.size())
            .param("fallback", request.fallback_mode().as_str())
            .param("bgColor", request.background().to_string())
            .param("textColor", request.text_color().to_string())
            .param("format", request.format().as_str());

        if request.fallback_mode() == FallbackMode::Url
            && let Some(fallback_url) = request.fallback_url()
        {
            builder = builder.param("fallbackUrl", fallback_url);
        }

        builder
    }

    pub fn size(self, size: u32) -> Self {
        self.param("size", size.to_string())
    }

    fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    /// Render the URL, percent-encoding every value
    pub fn build(&self) -> String {
        let query = self
            .params
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.endpoint)
    }
}
