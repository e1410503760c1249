/// Configuration default values
///
/// This module contains all the default values for configuration options and
/// request parameters, making them easily changeable in one central location.
use crate::models::HexColor;

// Request defaults
pub const DEFAULT_ICON_SIZE: u32 = 32;
pub const DEFAULT_BACKGROUND_COLOR: HexColor = HexColor::new(0x63, 0x66, 0xf1); // #6366f1
pub const DEFAULT_TEXT_COLOR: HexColor = HexColor::new(0xff, 0xff, 0xff); // #ffffff

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 86_400;
pub const DEFAULT_REQUEST_DEADLINE_SECS: u64 = 30;

// Resolver defaults
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_DISCOVER_PAGE_LINKS: bool = true;
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Third-party aggregators in priority order; `{domain}` and `{size}` are substituted
pub const DEFAULT_AGGREGATORS: [&str; 3] = [
    "https://www.google.com/s2/favicons?domain={domain}&sz={size}",
    "https://favicon.yandex.net/favicon/{domain}",
    "https://icons.duckduckgo.com/ip3/{domain}.ico",
];

// Cache defaults
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

// Avatar defaults
pub const DEFAULT_MAX_ICON_SIZE: u32 = 512;
/// Hard ceiling on any avatar canvas, whatever `avatar.max_size` says
pub const MAX_AVATAR_SIZE: u32 = 2048;
