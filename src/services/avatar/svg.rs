//! Vector letter avatars

use bytes::Bytes;

use super::font::FONT_FAMILY;
use super::{AvatarSpec, check_size};
use crate::errors::RenderResult;

/// Render `spec` as standalone SVG markup
pub fn render_svg(spec: &AvatarSpec) -> RenderResult<Bytes> {
    check_size(spec.size)?;

    let size = spec.size;
    let markup = format!(
        concat!(
            r#"<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<rect width="{size}" height="{size}" fill="{bg}"/>"#,
            r#"<text x="50%" y="50%" font-family="{family}, Arial, sans-serif" font-size="{font}" font-weight="bold" "#,
            r#"text-anchor="middle" dominant-baseline="central" fill="{fg}">{letter}</text>"#,
            "</svg>"
        ),
        size = size,
        family = FONT_FAMILY,
        bg = spec.background,
        fg = spec.text_color,
        font = spec.font_size(),
        letter = escape_xml(&spec.letter),
    );

    Ok(Bytes::from(markup))
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
