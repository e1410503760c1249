//! Icon link discovery in HTML pages
//!
//! The resolver hands over the bytes of a site's root page and gets back the
//! absolute URLs of every `<link>` whose `rel` mentions `icon`, in document
//! order. The trait keeps the resolver free of any parsing vocabulary.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("link tag pattern is valid"));

static BASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<base\b[^>]*>").expect("base tag pattern is valid"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute pattern is valid")
});

/// Extract icon link targets from an HTML document
#[cfg_attr(test, mockall::automock)]
pub trait IconLinkExtractor: Send + Sync {
    /// Absolute http(s) URLs of icon links, resolved against `base_url`
    fn extract_icon_links(&self, html: &[u8], base_url: &Url) -> Vec<String>;
}

/// Tolerant tag scanner; malformed markup yields fewer links, never an error
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexIconLinkExtractor;

impl IconLinkExtractor for RegexIconLinkExtractor {
    fn extract_icon_links(&self, html: &[u8], base_url: &Url) -> Vec<String> {
        let document = String::from_utf8_lossy(html);

        // A <base href> in the document overrides the page URL
        let base = BASE_TAG
            .find(&document)
            .and_then(|tag| parse_attributes(tag.as_str()).remove("href"))
            .and_then(|href| base_url.join(&href).ok())
            .unwrap_or_else(|| base_url.clone());

        let mut links: Vec<String> = Vec::new();
        for tag in LINK_TAG.find_iter(&document) {
            let attributes = parse_attributes(tag.as_str());

            let is_icon = attributes
                .get("rel")
                .is_some_and(|rel| rel.to_ascii_lowercase().contains("icon"));
            if !is_icon {
                continue;
            }

            let Some(href) = attributes.get("href").map(|h| h.trim()).filter(|h| !h.is_empty())
            else {
                continue;
            };

            let Ok(resolved) = base.join(href) else {
                continue;
            };
            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }

            let resolved = resolved.to_string();
            if !links.contains(&resolved) {
                links.push(resolved);
            }
        }

        links
    }
}

/// Attribute names lowercased, values with the common entities decoded
fn parse_attributes(tag: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(tag)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or(caps.get(3)).or(caps.get(4))?.as_str();
            Some((name, decode_entities(value)))
        })
        .collect()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
