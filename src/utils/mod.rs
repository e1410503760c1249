pub mod api_url;
pub mod domain;

pub use api_url::FaviconUrlBuilder;
pub use domain::{avatar_letter, normalize_domain};
