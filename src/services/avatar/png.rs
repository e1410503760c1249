//! Raster letter avatars

use bytes::Bytes;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tiny_skia::{Color, FillRule, Paint, Pixmap};

use super::font::{embedded_face, layout_centered};
use super::{AvatarSpec, check_size};
use crate::errors::{RenderError, RenderResult};
use crate::models::HexColor;

/// Render `spec` as a PNG of exactly `size` x `size` pixels
pub fn render_png(spec: &AvatarSpec) -> RenderResult<Bytes> {
    check_size(spec.size)?;

    let canvas = draw(spec)?;

    let mut png_bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| RenderError::encode("png", e.to_string()))?;

    Ok(Bytes::from(png_bytes))
}

fn skia_color(color: HexColor) -> Color {
    let [r, g, b, a] = color.to_rgba();
    Color::from_rgba8(r, g, b, a)
}

/// Paint the avatar the way the SVG markup describes it
fn draw(spec: &AvatarSpec) -> RenderResult<RgbaImage> {
    let size = spec.size;
    let mut pixmap = Pixmap::new(size, size).ok_or(RenderError::InvalidSize { size })?;
    pixmap.fill(skia_color(spec.background));

    let font_size = spec.font_size();
    if font_size > 0 {
        let face = embedded_face()?;
        let centre = size as f32 / 2.0;

        let mut paint = Paint::default();
        paint.set_color(skia_color(spec.text_color));
        paint.anti_alias = true;

        for glyph in layout_centered(&face, &spec.letter, font_size as f32, centre, centre) {
            pixmap.fill_path(&glyph.path, &paint, FillRule::Winding, glyph.transform, None);
        }
    }

    // Opaque background, so premultiplied and straight alpha coincide
    RgbaImage::from_raw(size, size, pixmap.take())
        .ok_or_else(|| RenderError::encode("png", "canvas buffer size mismatch"))
}
