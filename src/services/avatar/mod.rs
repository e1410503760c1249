//! Letter avatar synthesis
//!
//! The last fallback tier of a resolution: a square canvas filled with the
//! background colour and one bold uppercase letter centred on it. Two
//! encodings are available and describe the same picture:
//!
//! - **SVG**: inline vector markup, usable where no raster surface exists
//! - **PNG**: raster bitmap with the letter drawn from an embedded bold face
//!
//! Rendering is deterministic: the same spec always yields the same bytes.

pub mod font;
pub mod png;
pub mod svg;

use bytes::Bytes;

use crate::config::defaults::MAX_AVATAR_SIZE;
use crate::errors::{RenderError, RenderResult};
use crate::models::{AvatarFormat, HexColor, ResolutionRequest};

/// Everything needed to draw one avatar
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarSpec {
    pub letter: String,
    pub background: HexColor,
    pub text_color: HexColor,
    pub size: u32,
    pub format: AvatarFormat,
}

impl AvatarSpec {
    /// Spec for the fallback avatar of `request`
    pub fn for_request(request: &ResolutionRequest) -> Self {
        Self {
            letter: request.avatar_letter(),
            background: request.background(),
            text_color: request.text_color(),
            size: request.size(),
            format: request.format(),
        }
    }

    /// Font size in pixels: floor(0.6 * size)
    pub fn font_size(&self) -> u32 {
        (u64::from(self.size) * 3 / 5) as u32
    }
}

/// Both encodings accept `1..=MAX_AVATAR_SIZE`
pub(crate) fn check_size(size: u32) -> RenderResult<()> {
    if size == 0 || size > MAX_AVATAR_SIZE {
        return Err(RenderError::InvalidSize { size });
    }
    Ok(())
}

/// Encoded avatar bytes plus their media type
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAvatar {
    pub bytes: Bytes,
    pub media_type: &'static str,
}

/// Capability to turn an [`AvatarSpec`] into image bytes
pub trait AvatarRenderer: Send + Sync {
    fn render(&self, spec: &AvatarSpec) -> RenderResult<RenderedAvatar>;
}

/// Renderer that honours the spec's requested encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct LetterAvatarRenderer;

impl AvatarRenderer for LetterAvatarRenderer {
    fn render(&self, spec: &AvatarSpec) -> RenderResult<RenderedAvatar> {
        let bytes = match spec.format {
            AvatarFormat::Svg => svg::render_svg(spec)?,
            AvatarFormat::Png => png::render_png(spec)?,
        };

        Ok(RenderedAvatar {
            bytes,
            media_type: spec.format.media_type(),
        })
    }
}
