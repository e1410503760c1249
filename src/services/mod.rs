//! Service layer for favicon resolution
//!
//! The resolver orchestrates four collaborators, each behind its own seam so
//! a deployment can swap the implementation it needs:
//!
//! - [`SourceCatalog`]: ordered candidate URLs for a domain
//! - [`FetchClient`]: bytes from a URL within a timeout
//! - [`IconLinkExtractor`]: icon links from a page's markup
//! - [`AvatarRenderer`]: the letter avatar of last resort
//!
//! Results are kept in a [`ResultCache`] owned by the resolver.

pub mod avatar;
pub mod cache;
pub mod catalog;
pub mod fetch;
pub mod icon_links;
pub mod resolver;

pub use avatar::{AvatarRenderer, AvatarSpec, LetterAvatarRenderer, RenderedAvatar};
pub use cache::{CacheStats, ResultCache};
pub use catalog::{CandidateKind, CandidateSource, SourceCatalog};
pub use fetch::{FetchClient, FetchedBytes, HttpFetchClient};
pub use icon_links::{IconLinkExtractor, RegexIconLinkExtractor};
pub use resolver::{FaviconResolver, FaviconResolverBuilder};
