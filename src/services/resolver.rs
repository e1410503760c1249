//! Favicon resolution with ordered fallback
//!
//! [`FaviconResolver`] ties the source catalog, a fetch capability, an icon
//! link extractor and an avatar renderer together:
//!
//! 1. Cached result for the `(domain, size)` key, if any
//! 2. Candidates from the catalog (page-discovered links spliced in ahead of
//!    the static guesses), probed strictly in order, first success wins
//! 3. One extra fetch of the request's fallback URL in `url` mode
//! 4. A generated letter avatar
//!
//! Per-candidate failures never leave this module. The only error a caller
//! can see is a [`RenderError`] from the last tier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::avatar::{AvatarRenderer, AvatarSpec, LetterAvatarRenderer};
use super::cache::{CacheStats, ResultCache};
use super::catalog::{CandidateSource, SourceCatalog};
use super::fetch::{FetchClient, FetchedBytes, HttpFetchClient};
use super::icon_links::{IconLinkExtractor, RegexIconLinkExtractor};
use crate::config::ResolverConfig;
use crate::errors::{AppResult, FetchError, FetchResult, RenderError, RenderResult};
use crate::models::{ResolutionKey, ResolutionRequest, ResolvedIcon};

const DEFAULT_REMOTE_MEDIA_TYPE: &str = "image/png";

pub struct FaviconResolver {
    catalog: SourceCatalog,
    fetch_client: Arc<dyn FetchClient>,
    link_extractor: Arc<dyn IconLinkExtractor>,
    renderer: Arc<dyn AvatarRenderer>,
    cache: ResultCache,
    fetch_timeout: Duration,
    discover_page_links: bool,
    /// One gate per key currently being resolved
    in_flight: InFlightGates,
}

type InFlightGates = StdMutex<HashMap<ResolutionKey, Arc<Mutex<()>>>>;

/// Claim on a key's gate, released when dropped
///
/// Dropping happens on every exit path, including a resolve future that is
/// abandoned mid-await, so the map only ever holds keys someone still uses.
struct InFlightGuard<'a> {
    gates: &'a InFlightGates,
    key: ResolutionKey,
    gate: Arc<Mutex<()>>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(gates: &'a InFlightGates, key: &ResolutionKey) -> Self {
        let mut map = gates.lock().unwrap_or_else(PoisonError::into_inner);
        let gate = Arc::clone(map.entry(key.clone()).or_default());
        Self {
            gates,
            key: key.clone(),
            gate,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // New claims clone under the map lock, so two references means just
        // this guard and the map entry
        if Arc::strong_count(&self.gate) == 2 {
            map.remove(&self.key);
        }
    }
}

/// Collaborators default to the production implementations
pub struct FaviconResolverBuilder {
    config: ResolverConfig,
    cache: Option<ResultCache>,
    fetch_client: Option<Arc<dyn FetchClient>>,
    link_extractor: Option<Arc<dyn IconLinkExtractor>>,
    renderer: Option<Arc<dyn AvatarRenderer>>,
}

impl FaviconResolverBuilder {
    pub fn cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn fetch_client(mut self, client: Arc<dyn FetchClient>) -> Self {
        self.fetch_client = Some(client);
        self
    }

    pub fn link_extractor(mut self, extractor: Arc<dyn IconLinkExtractor>) -> Self {
        self.link_extractor = Some(extractor);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn AvatarRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Fails only when the default HTTP client cannot be constructed
    pub fn build(self) -> AppResult<FaviconResolver> {
        let fetch_client = match self.fetch_client {
            Some(client) => client,
            None => Arc::new(HttpFetchClient::new(&self.config)?),
        };

        Ok(FaviconResolver {
            catalog: SourceCatalog::from_config(&self.config),
            fetch_client,
            link_extractor: self
                .link_extractor
                .unwrap_or_else(|| Arc::new(RegexIconLinkExtractor)),
            renderer: self
                .renderer
                .unwrap_or_else(|| Arc::new(LetterAvatarRenderer)),
            cache: self.cache.unwrap_or_default(),
            fetch_timeout: self.config.fetch_timeout,
            discover_page_links: self.config.discover_page_links,
            in_flight: StdMutex::new(HashMap::new()),
        })
    }
}

impl FaviconResolver {
    pub fn builder(config: ResolverConfig) -> FaviconResolverBuilder {
        FaviconResolverBuilder {
            config,
            cache: None,
            fetch_client: None,
            link_extractor: None,
            renderer: None,
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Resolve without an external deadline
    pub async fn resolve(&self, request: &ResolutionRequest) -> RenderResult<ResolvedIcon> {
        self.resolve_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Resolve, abandoning remote sources once `cancel` fires
    ///
    /// Cancellation is not an error: the in-flight fetch is aborted and the
    /// letter avatar is returned. Avatars produced because of cancellation are
    /// not cached, so a later request still gets a chance at the real icon.
    pub async fn resolve_with_cancellation(
        &self,
        request: &ResolutionRequest,
        cancel: CancellationToken,
    ) -> RenderResult<ResolvedIcon> {
        let key = request.key();

        if let Some(icon) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(icon);
        }

        let claim = InFlightGuard::acquire(&self.in_flight, &key);

        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            guard = claim.gate.lock() => Some(guard),
        };

        match guard {
            // Another resolution of this key may have finished while we waited
            Some(_guard) => match self.cache.peek(&key).await {
                Some(icon) => {
                    debug!("Cache filled by concurrent resolution of {}", key);
                    Ok(icon)
                }
                None => self.resolve_uncached(request, &key, &cancel).await,
            },
            None => self.generate_avatar(request),
        }
    }

    async fn resolve_uncached(
        &self,
        request: &ResolutionRequest,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> RenderResult<ResolvedIcon> {
        let candidates = self.candidates_for(request, cancel).await;
        debug!("Probing {} candidates for {}", candidates.len(), key);

        for candidate in &candidates {
            if cancel.is_cancelled() {
                break;
            }

            match self.probe(&candidate.url, cancel).await {
                Ok(fetched) => {
                    info!(
                        "Resolved favicon for {} from {} ({})",
                        key, candidate.url, candidate.kind
                    );
                    let icon = remote_icon(fetched, &candidate.url);
                    self.cache.insert(key.clone(), icon.clone()).await;
                    return Ok(icon);
                }
                Err(e) => debug!("Candidate failed: {}", e),
            }
        }

        if let Some(fallback_url) = request.fallback_target()
            && !cancel.is_cancelled()
        {
            match self.probe(fallback_url, cancel).await {
                Ok(fetched) => {
                    info!("Resolved favicon for {} from fallback URL", key);
                    let icon = remote_icon(fetched, fallback_url);
                    self.cache.insert(key.clone(), icon.clone()).await;
                    return Ok(icon);
                }
                Err(e) => warn!("Fallback URL failed for {}: {}", key, e),
            }
        }

        if cancel.is_cancelled() {
            warn!("Resolution of {} cancelled, serving generated avatar", key);
            return self.generate_avatar(request);
        }

        warn!("No remote favicon for {}, generating avatar", key);
        let icon = self.generate_avatar(request)?;
        self.cache.insert(key.clone(), icon.clone()).await;
        Ok(icon)
    }

    /// Catalog candidates, with the root page's icon links when enabled
    async fn candidates_for(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
    ) -> Vec<CandidateSource> {
        let candidates = self
            .catalog
            .build_candidates(request.domain(), request.size());

        if !self.discover_page_links {
            return candidates;
        }

        let page_url = SourceCatalog::page_url(request.domain());
        let page = match self.probe(&page_url, cancel).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Icon link discovery skipped: {}", e);
                return candidates;
            }
        };

        let base = Url::parse(&page.final_url).or_else(|_| Url::parse(&page_url));
        let Ok(base) = base else {
            return candidates;
        };

        let links = self.link_extractor.extract_icon_links(&page.bytes, &base);
        debug!("Found {} icon links on {}", links.len(), base);

        SourceCatalog::merge_page_links(candidates, links)
    }

    /// One fetch attempt in its own task, bounded by the per-attempt timeout
    async fn probe(&self, url: &str, cancel: &CancellationToken) -> FetchResult<FetchedBytes> {
        let client = Arc::clone(&self.fetch_client);
        let timeout = self.fetch_timeout;
        let target = url.to_string();
        let mut task = tokio::spawn(async move { client.fetch(&target, timeout).await });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            joined = tokio::time::timeout(timeout, &mut task) => Some(joined),
        };

        match outcome {
            None => {
                task.abort();
                Err(FetchError::Cancelled {
                    url: url.to_string(),
                })
            }
            Some(Err(_elapsed)) => {
                task.abort();
                Err(FetchError::Timeout {
                    url: url.to_string(),
                })
            }
            Some(Ok(Ok(result))) => result,
            Some(Ok(Err(join_error))) => Err(FetchError::Crashed {
                url: url.to_string(),
                message: join_error.to_string(),
            }),
        }
    }

    fn generate_avatar(&self, request: &ResolutionRequest) -> RenderResult<ResolvedIcon> {
        let rendered = self.renderer.render(&AvatarSpec::for_request(request))?;
        if rendered.bytes.is_empty() {
            return Err(RenderError::encode(
                request.format().as_str(),
                "renderer produced no bytes",
            ));
        }
        Ok(ResolvedIcon::generated(rendered.bytes, rendered.media_type))
    }
}

/// Media type from magic bytes, then an upstream `image/*` header, then PNG
fn remote_media_type(fetched: &FetchedBytes) -> String {
    if let Some(kind) = infer::get(&fetched.bytes)
        && kind.mime_type().starts_with("image/")
    {
        return kind.mime_type().to_string();
    }

    fetched
        .content_type
        .as_deref()
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|value| value.to_ascii_lowercase().starts_with("image/"))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_REMOTE_MEDIA_TYPE.to_string())
}

fn remote_icon(fetched: FetchedBytes, source_url: &str) -> ResolvedIcon {
    let media_type = remote_media_type(&fetched);
    ResolvedIcon::remote(fetched.bytes, media_type, source_url)
}
