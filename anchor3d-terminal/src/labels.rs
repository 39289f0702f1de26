/// Composites overlay labels from a headless document onto the ASCII frame
use anchor3d_core::overlay::CENTER_TRANSFORM;
use anchor3d_core::{HeadlessDocument, HeadlessElement, OFFSCREEN};

use crate::renderer::AsciiRenderer;

/// Extract the pixel offset from a `translate3d(<x>px,<y>px,0) ...` transform
pub fn parse_translate(transform: &str) -> Option<(f32, f32)> {
    let args = transform.trim().strip_prefix("translate3d(")?;
    let args = &args[..args.find(')')?];

    let mut parts = args.split(',').map(str::trim);
    let x = parts.next()?.strip_suffix("px")?.parse().ok()?;
    let y = parts.next()?.strip_suffix("px")?.parse().ok()?;
    Some((x, y))
}

/// Draw every label root attached to the document body.
///
/// Terminal cells cannot be scaled, so only the translation is honoured.
pub fn paint_labels(renderer: &mut AsciiRenderer, document: &HeadlessDocument) {
    for root in document.body().children() {
        let Some((x, y)) = root.style("transform").as_deref().and_then(parse_translate) else {
            continue;
        };
        if x == OFFSCREEN || y == OFFSCREEN {
            continue;
        }

        for content in root.children() {
            paint_content(renderer, &content, x, y);
        }
    }
}

fn paint_content(renderer: &mut AsciiRenderer, content: &HeadlessElement, x: f32, y: f32) {
    let text = content.text();
    let mut column = x.round() as i32;
    if content.style("transform").as_deref() == Some(CENTER_TRANSFORM) {
        let half = i32::try_from(text.chars().count() / 2).unwrap_or(i32::MAX);
        column = column.saturating_sub(half);
    }
    renderer.put_text(column, y.round() as i32, &text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor3d_core::OverlayElement;

    #[test]
    fn test_parse_translate() {
        assert_eq!(
            parse_translate("translate3d(12.5px,-3px,0) scale(0.5)"),
            Some((12.5, -3.0))
        );
        assert_eq!(
            parse_translate("translate3d(-1000000000px,-1000000000px,0) scale(1)"),
            Some((OFFSCREEN, OFFSCREEN))
        );
        assert_eq!(parse_translate("scale(2)"), None);
        assert_eq!(parse_translate("translate3d(4,5px,0)"), None);
    }

    fn label(document: &HeadlessDocument, transform: &str, text: &str, centered: bool) {
        let root = HeadlessElement::new("div");
        let content = HeadlessElement::new("div");
        content.set_text(text);
        if centered {
            content.set_style("transform", CENTER_TRANSFORM);
        }
        root.set_style("transform", transform);
        root.append_child(&content);
        document.body().append_child(&root);
    }

    #[test]
    fn test_paint_centered_label() {
        let document = HeadlessDocument::new();
        label(&document, "translate3d(10px,2px,0) scale(1)", "abcd", true);

        let mut renderer = AsciiRenderer::new(20, 5);
        paint_labels(&mut renderer, &document);

        assert_eq!(renderer.char_at(8, 2), Some('a'));
        assert_eq!(renderer.char_at(11, 2), Some('d'));
    }

    #[test]
    fn test_far_away_labels_do_not_overflow() {
        let document = HeadlessDocument::new();
        label(&document, "translate3d(-3e38px,1px,0) scale(1)", "left", true);
        label(&document, "translate3d(3e38px,2px,0) scale(1)", "right", true);

        let mut renderer = AsciiRenderer::new(20, 5);
        paint_labels(&mut renderer, &document);

        for y in 0..5 {
            for x in 0..20 {
                assert_eq!(renderer.char_at(x, y), Some(' '));
            }
        }
    }

    #[test]
    fn test_offscreen_label_is_skipped() {
        let document = HeadlessDocument::new();
        label(
            &document,
            "translate3d(-1000000000px,-1000000000px,0) scale(1)",
            "gone",
            false,
        );

        let mut renderer = AsciiRenderer::new(20, 5);
        paint_labels(&mut renderer, &document);

        for y in 0..5 {
            for x in 0..20 {
                assert_eq!(renderer.char_at(x, y), Some(' '));
            }
        }
    }
}
