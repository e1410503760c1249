//! Candidate source catalog
//!
//! Produces the ordered list of URLs the resolver probes for a domain. The
//! list is a pure function of `(domain, size)` and the configuration; nothing
//! here performs I/O. Page-discovered icon links are spliced in separately via
//! [`SourceCatalog::merge_page_links`] once the resolver has fetched the page.

use std::fmt;

use crate::config::ResolverConfig;
use crate::utils::FaviconUrlBuilder;

/// Well-known icon locations on the domain itself, in probe order
pub const STATIC_ICON_PATHS: [&str; 7] = [
    "/favicon.ico",
    "/favicon.png",
    "/apple-touch-icon.png",
    "/apple-touch-icon-precomposed.png",
    "/assets/favicon.ico",
    "/static/favicon.ico",
    "/images/favicon.ico",
];

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    LocalEndpoint,
    PageLink,
    StaticPath,
    Aggregator,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalEndpoint => "local_endpoint",
            Self::PageLink => "page_link",
            Self::StaticPath => "static_path",
            Self::Aggregator => "aggregator",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL that might serve a usable icon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSource {
    pub url: String,
    pub kind: CandidateKind,
}

impl CandidateSource {
    fn new(url: impl Into<String>, kind: CandidateKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCatalog {
    local_endpoint: Option<String>,
    aggregators: Vec<String>,
}

impl SourceCatalog {
    pub fn new(local_endpoint: Option<String>, aggregators: Vec<String>) -> Self {
        Self {
            local_endpoint: local_endpoint.filter(|e| !e.trim().is_empty()),
            aggregators,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.local_endpoint.clone(), config.aggregators.clone())
    }

    /// Root page probed for `<link rel="icon">` relations
    pub fn page_url(domain: &str) -> String {
        format!("https://{domain}/")
    }

    /// Ordered candidates: local endpoint, static paths, then aggregators
    pub fn build_candidates(&self, domain: &str, size: u32) -> Vec<CandidateSource> {
        let mut candidates =
            Vec::with_capacity(STATIC_ICON_PATHS.len() + self.aggregators.len() + 1);

        if let Some(endpoint) = &self.local_endpoint {
            candidates.push(CandidateSource::new(
                FaviconUrlBuilder::new(endpoint.as_str(), domain).size(size).build(),
                CandidateKind::LocalEndpoint,
            ));
        }

        candidates.extend(STATIC_ICON_PATHS.iter().map(|path| {
            CandidateSource::new(format!("https://{domain}{path}"), CandidateKind::StaticPath)
        }));

        candidates.extend(self.aggregators.iter().map(|template| {
            CandidateSource::new(
                template
                    .replace("{domain}", &urlencoding::encode(domain))
                    .replace("{size}", &size.to_string()),
                CandidateKind::Aggregator,
            )
        }));

        candidates
    }

    /// Insert page-discovered links ahead of the static path guesses
    ///
    /// Links already present in the list are not repeated; their earlier
    /// position wins.
    pub fn merge_page_links(
        candidates: Vec<CandidateSource>,
        page_links: Vec<String>,
    ) -> Vec<CandidateSource> {
        if page_links.is_empty() {
            return candidates;
        }

        let insert_at = candidates
            .iter()
            .position(|c| c.kind != CandidateKind::LocalEndpoint)
            .unwrap_or(candidates.len());

        let mut page_candidates: Vec<CandidateSource> = Vec::with_capacity(page_links.len());
        for link in page_links {
            let seen = page_candidates.iter().any(|c| c.url == link)
                || candidates[..insert_at].iter().any(|c| c.url == link);
            if !seen {
                page_candidates.push(CandidateSource::new(link, CandidateKind::PageLink));
            }
        }

        let mut merged = Vec::with_capacity(candidates.len() + page_candidates.len());
        let mut rest = candidates.into_iter();
        merged.extend(rest.by_ref().take(insert_at));
        merged.extend(page_candidates.iter().cloned());
        merged.extend(rest.filter(|c| !page_candidates.iter().any(|p| p.url == c.url)));
        merged
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(candidates: &[CandidateSource]) -> Vec<&str> {
        candidates.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn test_default_ordering() {
        let candidates = SourceCatalog::default().build_candidates("example.com", 64);

        assert_eq!(
            urls(&candidates),
            vec![
                "https://example.com/favicon.ico",
                "https://example.com/favicon.png",
                "https://example.com/apple-touch-icon.png",
                "https://example.com/apple-touch-icon-precomposed.png",
                "https://example.com/assets/favicon.ico",
                "https://example.com/static/favicon.ico",
                "https://example.com/images/favicon.ico",
                "https://www.google.com/s2/favicons?domain=example.com&sz=64",
                "https://favicon.yandex.net/favicon/example.com",
                "https://icons.duckduckgo.com/ip3/example.com.ico",
            ]
        );
        assert!(
            candidates[..7]
                .iter()
                .all(|c| c.kind == CandidateKind::StaticPath)
        );
        assert!(
            candidates[7..]
                .iter()
                .all(|c| c.kind == CandidateKind::Aggregator)
        );
    }

    #[test]
    fn test_local_endpoint_comes_first() {
        let catalog = SourceCatalog::new(
            Some("https://icons.internal/favicon".to_string()),
            Vec::new(),
        );
        let candidates = catalog.build_candidates("github.com", 32);

        assert_eq!(candidates[0].kind, CandidateKind::LocalEndpoint);
        assert_eq!(
            candidates[0].url,
            "https://icons.internal/favicon?domain=github.com&size=32"
        );
        assert_eq!(candidates.len(), 1 + STATIC_ICON_PATHS.len());
    }

    #[test]
    fn test_blank_local_endpoint_is_ignored() {
        let catalog = SourceCatalog::new(Some("  ".to_string()), Vec::new());
        assert_eq!(catalog.build_candidates("a.com", 16)[0].kind, CandidateKind::StaticPath);
    }

    #[test]
    fn test_deterministic() {
        let catalog = SourceCatalog::default();
        assert_eq!(
            catalog.build_candidates("example.com", 32),
            catalog.build_candidates("example.com", 32)
        );
    }

    #[test]
    fn test_page_links_go_ahead_of_static_paths() {
        let catalog = SourceCatalog::new(
            Some("https://icons.internal/favicon".to_string()),
            vec!["https://agg.example/{domain}".to_string()],
        );
        let candidates = catalog.build_candidates("example.com", 32);

        let merged = SourceCatalog::merge_page_links(
            candidates,
            vec![
                "https://example.com/icons/icon-192.png".to_string(),
                "https://example.com/favicon.ico".to_string(),
                "https://example.com/icons/icon-192.png".to_string(),
            ],
        );

        let kinds: Vec<CandidateKind> = merged.iter().map(|c| c.kind).collect();
        assert_eq!(kinds[0], CandidateKind::LocalEndpoint);
        assert_eq!(kinds[1], CandidateKind::PageLink);
        assert_eq!(kinds[2], CandidateKind::PageLink);
        assert_eq!(merged[1].url, "https://example.com/icons/icon-192.png");
        assert_eq!(merged[2].url, "https://example.com/favicon.ico");

        // The static duplicate moved forward, it is not probed twice
        let favicon_count = merged
            .iter()
            .filter(|c| c.url == "https://example.com/favicon.ico")
            .count();
        assert_eq!(favicon_count, 1);
        assert_eq!(merged.len(), 1 + 2 + (STATIC_ICON_PATHS.len() - 1) + 1);
        assert_eq!(merged.last().unwrap().kind, CandidateKind::Aggregator);
    }

    #[test]
    fn test_no_page_links_leaves_list_untouched() {
        let candidates = SourceCatalog::default().build_candidates("example.com", 32);
        assert_eq!(
            SourceCatalog::merge_page_links(candidates.clone(), Vec::new()),
            candidates
        );
    }
}
