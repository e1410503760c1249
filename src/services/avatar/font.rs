//! Embedded bold face for raster letter avatars
//!
//! DejaVu Sans Bold is compiled into the binary so PNG avatars do not depend
//! on whatever fonts the host has installed. The SVG encoding names the same
//! family first, so both encodings show the same glyph shapes.

use tiny_skia::{Path, PathBuilder, Transform};
use ttf_parser::{Face, GlyphId};

use crate::errors::{RenderError, RenderResult};

const DEJAVU_SANS_BOLD_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// CSS family name of the embedded face
pub const FONT_FAMILY: &str = "DejaVu Sans";

/// Parse the embedded face
pub fn embedded_face() -> RenderResult<Face<'static>> {
    Face::parse(DEJAVU_SANS_BOLD_TTF, 0)
        .map_err(|e| RenderError::encode("png", format!("embedded font unreadable: {e}")))
}

/// Converts ttf-parser outlines into tiny-skia paths, in font units (y-up)
struct OutlineCollector {
    builder: PathBuilder,
}

impl ttf_parser::OutlineBuilder for OutlineCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// One glyph of a laid-out line
#[derive(Debug)]
pub struct PlacedGlyph {
    pub path: Path,
    pub transform: Transform,
}

/// Lay `text` out at `font_size` pixels, centred on (`center_x`, `center_y`)
///
/// Mirrors SVG `text-anchor="middle"` and `dominant-baseline="central"`: the
/// line's advance is centred horizontally and the middle of the em box sits
/// on `center_y`. Characters the face lacks draw as its missing-glyph box.
pub fn layout_centered(
    face: &Face<'_>,
    text: &str,
    font_size: f32,
    center_x: f32,
    center_y: f32,
) -> Vec<PlacedGlyph> {
    let scale = font_size / f32::from(face.units_per_em());

    let glyphs: Vec<GlyphId> = text
        .chars()
        .map(|c| face.glyph_index(c).unwrap_or(GlyphId(0)))
        .collect();
    let advance: f32 = glyphs
        .iter()
        .map(|&id| f32::from(face.glyph_hor_advance(id).unwrap_or(0)))
        .sum();

    let em_middle = (f32::from(face.ascender()) + f32::from(face.descender())) / 2.0;
    let baseline = center_y + em_middle * scale;
    let mut pen_x = center_x - advance * scale / 2.0;

    let mut placed = Vec::with_capacity(glyphs.len());
    for id in glyphs {
        let mut collector = OutlineCollector {
            builder: PathBuilder::new(),
        };
        let outlined = face.outline_glyph(id, &mut collector).is_some();

        if outlined && let Some(path) = collector.builder.finish() {
            placed.push(PlacedGlyph {
                path,
                // Font units are y-up, the canvas is y-down
                transform: Transform::from_row(scale, 0.0, 0.0, -scale, pen_x, baseline),
            });
        }
        pen_x += f32::from(face.glyph_hor_advance(id).unwrap_or(0)) * scale;
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_face_parses() {
        let face = embedded_face().unwrap();
        assert!(face.units_per_em() > 0);
        assert!(face.glyph_index('A').is_some());
        assert!(face.glyph_index('Ü').is_some());
    }

    #[test]
    fn test_single_glyph_is_centred() {
        let face = embedded_face().unwrap();
        let placed = layout_centered(&face, "O", 38.0, 32.0, 32.0);
        assert_eq!(placed.len(), 1);

        let bounds = placed[0]
            .path
            .clone()
            .transform(placed[0].transform)
            .unwrap()
            .bounds();
        let mid_x = (bounds.left() + bounds.right()) / 2.0;
        assert!((mid_x - 32.0).abs() < 1.5, "glyph centre at {mid_x}");
    }

    #[test]
    fn test_every_character_is_laid_out() {
        let face = embedded_face().unwrap();
        assert_eq!(layout_centered(&face, "SS", 20.0, 16.0, 16.0).len(), 2);
        // Space has an advance but no outline
        assert!(layout_centered(&face, " ", 20.0, 16.0, 16.0).is_empty());
    }
}
