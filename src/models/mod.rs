//! Core data types for favicon resolution
//!
//! A [`ResolutionRequest`] goes in, a [`ResolvedIcon`] comes out, and a
//! [`ResolutionKey`] identifies the cached result in between.

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::defaults::{
    DEFAULT_BACKGROUND_COLOR, DEFAULT_ICON_SIZE, DEFAULT_TEXT_COLOR, MAX_AVATAR_SIZE,
};
use crate::errors::{AppError, AppResult};
use crate::utils::domain::{avatar_letter, normalize_domain};

/// Strategy applied when no candidate source produced an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Synthesize a letter avatar
    #[default]
    Letter,
    /// Fetch a caller-supplied image, then fall back to a letter avatar
    Url,
}

impl FallbackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Letter => "letter",
            Self::Url => "url",
        }
    }
}

impl FromStr for FallbackMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(Self::Letter),
            "url" => Ok(Self::Url),
            other => Err(AppError::validation(format!(
                "Invalid fallback '{other}': expected 'letter' or 'url'"
            ))),
        }
    }
}

/// Delivery encoding for generated avatars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarFormat {
    /// Inline vector markup, no raster support needed
    #[default]
    Svg,
    /// Raster bitmap
    Png,
}

impl AvatarFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
        }
    }
}

impl FromStr for AvatarFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            other => Err(AppError::validation(format!(
                "Invalid format '{other}': expected 'svg' or 'png'"
            ))),
        }
    }
}

/// An sRGB colour parsed from `#rgb` or `#rrggbb` notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xff]
    }
}

impl FromStr for HexColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid color '{s}': expected #rgb or #rrggbb"));

        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);

        match hex.len() {
            3 => {
                let expand = |i: usize| channel(i..i + 1).map(|v| v * 17);
                Ok(Self::new(
                    expand(0).map_err(|_| invalid())?,
                    expand(1).map_err(|_| invalid())?,
                    expand(2).map_err(|_| invalid())?,
                ))
            }
            6 => Ok(Self::new(
                channel(0..2).map_err(|_| invalid())?,
                channel(2..4).map_err(|_| invalid())?,
                channel(4..6).map_err(|_| invalid())?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Cache identity of a resolution: normalized domain plus pixel size
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub domain: String,
    pub size: u32,
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.domain, self.size)
    }
}

/// A validated favicon request
///
/// The domain is always normalized and non-empty; construct through
/// [`ResolutionRequest::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRequest {
    domain: String,
    size: u32,
    fallback_mode: FallbackMode,
    background: HexColor,
    text_color: HexColor,
    fallback_url: Option<String>,
    format: AvatarFormat,
}

impl ResolutionRequest {
    pub fn builder(domain: impl Into<String>) -> ResolutionRequestBuilder {
        ResolutionRequestBuilder::new(domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn fallback_mode(&self) -> FallbackMode {
        self.fallback_mode
    }

    pub fn background(&self) -> HexColor {
        self.background
    }

    pub fn text_color(&self) -> HexColor {
        self.text_color
    }

    pub fn fallback_url(&self) -> Option<&str> {
        self.fallback_url.as_deref()
    }

    pub fn format(&self) -> AvatarFormat {
        self.format
    }

    pub fn key(&self) -> ResolutionKey {
        ResolutionKey {
            domain: self.domain.clone(),
            size: self.size,
        }
    }

    /// The fallback URL to try after every candidate failed.
    ///
    /// `Some` only in URL mode with a non-empty URL; otherwise the request
    /// degrades to letter mode.
    pub fn fallback_target(&self) -> Option<&str> {
        match self.fallback_mode {
            FallbackMode::Url => self.fallback_url().filter(|u| !u.trim().is_empty()),
            FallbackMode::Letter => None,
        }
    }

    /// Uppercased first character of the domain
    pub fn avatar_letter(&self) -> String {
        avatar_letter(&self.domain)
    }
}

/// Builder for [`ResolutionRequest`]
#[derive(Debug, Clone)]
pub struct ResolutionRequestBuilder {
    domain: String,
    size: u32,
    fallback_mode: FallbackMode,
    background: HexColor,
    text_color: HexColor,
    fallback_url: Option<String>,
    format: AvatarFormat,
}

impl ResolutionRequestBuilder {
    fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            size: DEFAULT_ICON_SIZE,
            fallback_mode: FallbackMode::default(),
            background: DEFAULT_BACKGROUND_COLOR,
            text_color: DEFAULT_TEXT_COLOR,
            fallback_url: None,
            format: AvatarFormat::default(),
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn fallback(mut self, mode: FallbackMode) -> Self {
        self.fallback_mode = mode;
        self
    }

    pub fn background(mut self, color: HexColor) -> Self {
        self.background = color;
        self
    }

    pub fn text_color(mut self, color: HexColor) -> Self {
        self.text_color = color;
        self
    }

    pub fn fallback_url(mut self, url: Option<String>) -> Self {
        self.fallback_url = url;
        self
    }

    pub fn format(mut self, format: AvatarFormat) -> Self {
        self.format = format;
        self
    }

    /// Validate and normalize into a request
    pub fn build(self) -> AppResult<ResolutionRequest> {
        let domain = normalize_domain(&self.domain)
            .ok_or_else(|| AppError::validation("Domain parameter is required"))?;

        if self.size == 0 || self.size > MAX_AVATAR_SIZE {
            return Err(AppError::validation(format!(
                "Size must be an integer between 1 and {MAX_AVATAR_SIZE}"
            )));
        }

        Ok(ResolutionRequest {
            domain,
            size: self.size,
            fallback_mode: self.fallback_mode,
            background: self.background,
            text_color: self.text_color,
            fallback_url: self.fallback_url,
            format: self.format,
        })
    }
}

/// Where the bytes of a resolved icon came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconOrigin {
    Remote,
    Generated,
}

impl IconOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Generated => "generated",
        }
    }
}

/// A resolved favicon; immutable once constructed
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIcon {
    bytes: Bytes,
    media_type: String,
    origin: IconOrigin,
    source_url: Option<String>,
}

impl ResolvedIcon {
    /// Icon fetched from `source_url`
    pub fn remote(bytes: Bytes, media_type: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            origin: IconOrigin::Remote,
            source_url: Some(source_url.into()),
        }
    }

    /// Locally synthesized avatar
    pub fn generated(bytes: Bytes, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            origin: IconOrigin::Generated,
            source_url: None,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn origin(&self) -> IconOrigin {
        self.origin
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// `data:` URL embedding the icon, for callers that inline images
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#6366f1", HexColor::new(0x63, 0x66, 0xf1))]
    #[case("ff6b6b", HexColor::new(0xff, 0x6b, 0x6b))]
    #[case("#FFF", HexColor::new(0xff, 0xff, 0xff))]
    #[case(" #0a0 ", HexColor::new(0x00, 0xaa, 0x00))]
    fn test_hex_color_parsing(#[case] input: &str, #[case] expected: HexColor) {
        assert_eq!(input.parse::<HexColor>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("#12")]
    #[case("#12345")]
    #[case("red")]
    #[case("#gggggg")]
    #[case("#ff6b6b00")]
    fn test_hex_color_rejects_garbage(#[case] input: &str) {
        assert!(input.parse::<HexColor>().is_err());
    }

    #[test]
    fn test_hex_color_display_is_lowercase_long_form() {
        let color: HexColor = "#ABC".parse().unwrap();
        assert_eq!(color.to_string(), "#aabbcc");
    }

    #[test]
    fn test_request_defaults() {
        let request = ResolutionRequest::builder("https://Example.com/path?x=1")
            .build()
            .unwrap();

        assert_eq!(request.domain(), "example.com");
        assert_eq!(request.size(), 32);
        assert_eq!(request.fallback_mode(), FallbackMode::Letter);
        assert_eq!(request.background().to_string(), "#6366f1");
        assert_eq!(request.text_color().to_string(), "#ffffff");
        assert_eq!(request.format(), AvatarFormat::Svg);
        assert_eq!(request.avatar_letter(), "E");
    }

    #[test]
    fn test_request_rejects_empty_domain_and_zero_size() {
        assert!(matches!(
            ResolutionRequest::builder("https://").build(),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            ResolutionRequest::builder("example.com").size(0).build(),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_request_rejects_sizes_beyond_the_canvas_ceiling() {
        assert!(
            ResolutionRequest::builder("example.com")
                .size(MAX_AVATAR_SIZE)
                .build()
                .is_ok()
        );
        assert!(matches!(
            ResolutionRequest::builder("example.com")
                .size(2_000_000_000)
                .build(),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_key_ignores_scheme_and_path() {
        let a = ResolutionRequest::builder("https://Example.com/path?x=1").build().unwrap();
        let b = ResolutionRequest::builder("example.com").build().unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().to_string(), "example.com_32");
    }

    #[test]
    fn test_fallback_target_degrades_to_letter() {
        let no_url = ResolutionRequest::builder("example.com")
            .fallback(FallbackMode::Url)
            .build()
            .unwrap();
        assert_eq!(no_url.fallback_target(), None);

        let blank_url = ResolutionRequest::builder("example.com")
            .fallback(FallbackMode::Url)
            .fallback_url(Some("  ".to_string()))
            .build()
            .unwrap();
        assert_eq!(blank_url.fallback_target(), None);

        let letter_mode = ResolutionRequest::builder("example.com")
            .fallback_url(Some("https://cdn.example/x.png".to_string()))
            .build()
            .unwrap();
        assert_eq!(letter_mode.fallback_target(), None);

        let url_mode = ResolutionRequest::builder("example.com")
            .fallback(FallbackMode::Url)
            .fallback_url(Some("https://cdn.example/x.png".to_string()))
            .build()
            .unwrap();
        assert_eq!(url_mode.fallback_target(), Some("https://cdn.example/x.png"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("URL".parse::<FallbackMode>().unwrap(), FallbackMode::Url);
        assert!("favicon".parse::<FallbackMode>().is_err());
        assert_eq!("png".parse::<AvatarFormat>().unwrap(), AvatarFormat::Png);
        assert!("gif".parse::<AvatarFormat>().is_err());
    }

    #[test]
    fn test_data_url() {
        let icon = ResolvedIcon::generated(Bytes::from_static(b"<svg/>"), "image/svg+xml");
        assert_eq!(icon.to_data_url(), "data:image/svg+xml;base64,PHN2Zy8+");
        assert_eq!(icon.origin(), IconOrigin::Generated);
        assert_eq!(icon.source_url(), None);
    }
}
