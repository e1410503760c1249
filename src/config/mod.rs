use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::models::AvatarFormat;
use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `Cache-Control: public, max-age=...` sent with every image
    #[serde(default = "default_cache_max_age", with = "duration_serde::duration")]
    pub cache_max_age: Duration,
    /// Overall budget for one resolve; on expiry the avatar is served
    #[serde(default = "default_request_deadline", with = "duration_serde::duration")]
    pub request_deadline: Duration,
    /// Externally visible origin used in shareable API URLs, e.g. `https://icons.example.net`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl WebConfig {
    /// `/favicon` endpoint as callers should reach it
    pub fn favicon_endpoint(&self) -> String {
        match self.public_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(base) => format!("{}/favicon", base.trim_end_matches('/')),
            None => "/favicon".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Per-attempt fetch timeout
    #[serde(default = "default_fetch_timeout", with = "duration_serde::duration")]
    pub fetch_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Redirects followed within a single attempt
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Largest response body read from any candidate or root page
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Fetch the domain's root page and probe its `<link rel="icon">` targets
    #[serde(default = "default_discover_page_links")]
    pub discover_page_links: bool,
    /// Optional upstream favicon endpoint probed before anything else
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_endpoint: Option<String>,
    /// Aggregator URL templates in priority order
    #[serde(default = "default_aggregators")]
    pub aggregators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of resolved icons kept in memory
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// Optional time-based expiry on top of the LRU bound
    #[serde(
        default,
        with = "duration_serde::option_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub ttl: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Encoding used when a request does not name one
    #[serde(default)]
    pub default_format: AvatarFormat,
    /// Largest `size` a request may ask for
    #[serde(default = "default_max_size")]
    pub max_size: u32,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cache_max_age() -> Duration {
    Duration::from_secs(DEFAULT_CACHE_MAX_AGE_SECS)
}

fn default_request_deadline() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_DEADLINE_SECS)
}

// Resolver defaults
fn default_fetch_timeout() -> Duration {
    Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_discover_page_links() -> bool {
    DEFAULT_DISCOVER_PAGE_LINKS
}

fn default_aggregators() -> Vec<String> {
    DEFAULT_AGGREGATORS.iter().map(|s| s.to_string()).collect()
}

// Cache defaults
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

// Avatar defaults
fn default_max_size() -> u32 {
    DEFAULT_MAX_ICON_SIZE
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cache_max_age: default_cache_max_age(),
            request_deadline: default_request_deadline(),
            public_url: None,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            discover_page_links: default_discover_page_links(),
            local_endpoint: None,
            aggregators: default_aggregators(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl: None,
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            default_format: AvatarFormat::default(),
            max_size: default_max_size(),
        }
    }
}

impl Config {
    /// Load `config_file`, writing out the defaults when it does not exist yet
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the resolver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.resolver.fetch_timeout.is_zero() {
            anyhow::bail!("resolver.fetch_timeout must be greater than zero");
        }
        if self.resolver.max_body_bytes == 0 {
            anyhow::bail!("resolver.max_body_bytes must be greater than zero");
        }
        if self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be at least 1");
        }
        if self.avatar.max_size == 0 || self.avatar.max_size > MAX_AVATAR_SIZE {
            anyhow::bail!("avatar.max_size must be between 1 and {}", MAX_AVATAR_SIZE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config = Config::default();
        assert_eq!(config.resolver.fetch_timeout, Duration::from_millis(5000));
        assert_eq!(config.web.cache_max_age, Duration::from_secs(86_400));
        assert_eq!(config.resolver.aggregators.len(), 3);
        assert!(config.resolver.aggregators[0].contains("{size}"));
        assert_eq!(config.resolver.local_endpoint, None);
        assert_eq!(config.resolver.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.avatar.default_format, AvatarFormat::Svg);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [resolver]
            fetch_timeout = "2s"
            local_endpoint = "https://icons.internal/favicon"

            [cache]
            capacity = 10
            ttl = "1h"

            [avatar]
            default_format = "png"
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver.fetch_timeout, Duration::from_secs(2));
        assert_eq!(
            config.resolver.local_endpoint.as_deref(),
            Some("https://icons.internal/favicon")
        );
        assert_eq!(config.cache.capacity, 10);
        assert_eq!(config.cache.ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.avatar.default_format, AvatarFormat::Png);
        assert_eq!(config.web.port, DEFAULT_PORT);
        assert_eq!(config.avatar.max_size, DEFAULT_MAX_ICON_SIZE);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let rendered = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.resolver.aggregators, Config::default().resolver.aggregators);
        assert_eq!(parsed.web.cache_max_age, Duration::from_secs(86_400));
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_favicon_endpoint_uses_public_url() {
        let mut web = WebConfig::default();
        assert_eq!(web.favicon_endpoint(), "/favicon");

        web.public_url = Some("https://icons.example.net/".to_string());
        assert_eq!(web.favicon_endpoint(), "https://icons.example.net/favicon");
    }

    #[test]
    fn test_validation_caps_max_size() {
        let mut config = Config::default();
        config.avatar.max_size = MAX_AVATAR_SIZE;
        assert!(config.validate().is_ok());
        config.avatar.max_size = MAX_AVATAR_SIZE + 1;
        assert!(config.validate().is_err());
    }
}
