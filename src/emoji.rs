//! Pre-export emoji normalization.
//!
//! Gradient text-fill themes clip heading glyphs to the gradient, which turns
//! color emoji monochrome in the exported bitmap. Before rasterization this
//! pass wraps emoji runs in marker elements that restore the natural glyph
//! fill, and points every emoji-bearing node at the platform emoji fonts. The
//! whole mutation is recorded into an [`UndoToken`] so it can be reverted
//! node-for-node after export.

use crate::dom::{Document, NodeData, NodeId, StylesheetId};
use crate::style::EffectiveStyle;

/// Platform emoji font stack appended to touched nodes.
pub const EMOJI_FONT_STACK: &str =
    "'Apple Color Emoji', 'Segoe UI Emoji', 'Noto Color Emoji', sans-serif";

const MARKER_ATTR: &str = "data-emoji";

/// Whether a code point falls in one of the recognized emoji blocks.
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1F6FF | 0x1F900..=0x1F9FF | 0x2600..=0x26FF | 0x2700..=0x27BF
    )
}

fn contains_emoji(s: &str) -> bool {
    s.chars().any(is_emoji)
}

#[derive(Debug)]
struct NodeRecord {
    node: NodeId,
    inner_html: String,
    color: Option<String>,
    text_fill: Option<String>,
    font_family: Option<String>,
}

/// Recorded pre-normalization state; consumed by [`UndoToken::revert`].
#[derive(Debug, Default)]
pub struct UndoToken {
    records: Vec<NodeRecord>,
}

impl UndoToken {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Restore exactly the recorded content and style fields, node-for-node.
    pub fn revert(self, doc: &mut Document) {
        for record in self.records.into_iter().rev() {
            doc.set_inner_html(record.node, &record.inner_html);
            if let Some(el) = doc.element_mut(record.node) {
                restore(&mut el.style, "color", record.color);
                restore(&mut el.style, "-webkit-text-fill-color", record.text_fill);
                restore(&mut el.style, "font-family", record.font_family);
            }
        }
    }
}

fn restore(style: &mut crate::dom::InlineStyle, name: &str, value: Option<String>) {
    match value {
        Some(v) => style.set(name, &v),
        None => {
            style.remove(name);
        }
    }
}

/// Normalize emoji rendering under `root`, returning the undo record.
///
/// Every element that directly carries emoji text gets the platform emoji
/// fonts appended to its font stack. Headings H1-H3 under a gradient-typed
/// style additionally have each emoji run wrapped in a marker span that
/// resets color, text-fill, and background so the glyph keeps its native
/// multi-color form.
pub fn apply(doc: &mut Document, root: NodeId, style: &EffectiveStyle) -> UndoToken {
    let mut token = UndoToken::default();

    let mut targets = Vec::new();
    for node in doc.descendants(root) {
        let Some(el) = doc.element(node) else { continue };
        let has_emoji_text = doc.children(node).iter().any(|child| {
            matches!(doc.data(*child), NodeData::Text(t) if contains_emoji(t))
        });
        if has_emoji_text {
            targets.push((node, el.tag.clone()));
        }
    }

    for (node, tag) in targets {
        let inner_html = doc.inner_html(node);
        let (color, text_fill, font_family) = {
            let el = doc.element(node).map(|e| &e.style);
            (
                el.and_then(|s| s.get("color").map(str::to_string)),
                el.and_then(|s| s.get("-webkit-text-fill-color").map(str::to_string)),
                el.and_then(|s| s.get("font-family").map(str::to_string)),
            )
        };
        token.records.push(NodeRecord {
            node,
            inner_html,
            color,
            text_fill,
            font_family,
        });

        let gradient_heading =
            style.is_gradient() && matches!(tag.as_str(), "h1" | "h2" | "h3");
        if gradient_heading {
            wrap_emoji_runs(doc, node);
        }

        if let Some(el) = doc.element_mut(node) {
            let base = el
                .style
                .get("font-family")
                .map(str::to_string)
                .unwrap_or_else(|| style.body_font.clone());
            el.style
                .set("font-family", &format!("{}, {}", base, EMOJI_FONT_STACK));
        }
    }

    token
}

/// Split every direct text child into plain and emoji runs, wrapping the
/// emoji runs in marker spans that defeat gradient text-fill clipping.
fn wrap_emoji_runs(doc: &mut Document, node: NodeId) {
    let children: Vec<NodeId> = doc.children(node).to_vec();
    let mut rebuilt: Vec<NodeId> = Vec::new();
    let mut changed = false;

    for child in children {
        let text = match doc.data(child) {
            NodeData::Text(t) if contains_emoji(t) => t.clone(),
            _ => {
                rebuilt.push(child);
                continue;
            }
        };
        changed = true;
        for (run, emoji_run) in split_runs(&text) {
            if emoji_run {
                let span = doc.create_element("span");
                if let Some(el) = doc.element_mut(span) {
                    el.set_attr(MARKER_ATTR, "true");
                    el.style.set("color", "initial");
                    el.style.set("-webkit-text-fill-color", "initial");
                    el.style.set("background", "none");
                }
                let inner = doc.create_text(&run);
                doc.append_child(span, inner);
                rebuilt.push(span);
            } else {
                rebuilt.push(doc.create_text(&run));
            }
        }
    }

    if changed {
        for child in doc.children(node).to_vec() {
            doc.detach(child);
        }
        for child in rebuilt {
            doc.append_child(node, child);
        }
    }
}

/// Partition text into maximal runs, flagging the emoji ones. Variation
/// selectors and joiners stay with the emoji run they follow.
fn split_runs(text: &str) -> Vec<(String, bool)> {
    let mut runs: Vec<(String, bool)> = Vec::new();
    for c in text.chars() {
        let emoji = is_emoji(c)
            || (matches!(c, '\u{FE0F}' | '\u{FE0E}' | '\u{200D}')
                && runs.last().map(|(_, e)| *e).unwrap_or(false));
        match runs.last_mut() {
            Some((run, flag)) if *flag == emoji => run.push(c),
            _ => runs.push((c.to_string(), emoji)),
        }
    }
    runs
}

/// Attach the blanket emoji-font rule used while rasterizing.
///
/// Pair with [`remove_export_stylesheet`] on every exit path; the export
/// engine treats the pair as an acquire/release around the raster loop.
pub fn insert_export_stylesheet(doc: &mut Document) -> StylesheetId {
    doc.add_stylesheet(&format!(
        "[{}] {{ font-family: {} !important; }}",
        MARKER_ATTR, EMOJI_FONT_STACK
    ))
}

/// Release the stylesheet fragment installed by [`insert_export_stylesheet`].
pub fn remove_export_stylesheet(doc: &mut Document, id: StylesheetId) {
    doc.remove_stylesheet(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleOverrides;
    use crate::theme;

    fn gradient_style() -> EffectiveStyle {
        let mut ovr = StyleOverrides::default();
        ovr.set_background_start("#2b4c7d");
        ovr.set_background_end("#567bbd");
        ovr.effective(&theme::resolve("light"))
    }

    fn solid_style() -> EffectiveStyle {
        StyleOverrides::default().effective(&theme::resolve("light"))
    }

    #[test]
    fn detects_all_spec_ranges() {
        assert!(is_emoji('\u{1F389}')); // party popper
        assert!(is_emoji('\u{1F9E9}')); // puzzle piece
        assert!(is_emoji('\u{2600}')); // sun
        assert!(is_emoji('\u{2728}')); // sparkles
        assert!(!is_emoji('a'));
        assert!(!is_emoji('\u{4E2D}')); // CJK
    }

    #[test]
    fn gradient_heading_gets_marker_spans() {
        let mut doc = Document::parse_fragment("<h1>Party \u{1F389} time</h1>", "article");
        let root = doc.root();
        let style = gradient_style();
        let token = apply(&mut doc, root, &style);
        assert!(!token.is_empty());
        let html = doc.inner_html(root);
        assert!(html.contains("data-emoji"), "no marker in: {}", html);
        assert!(html.contains("font-family"));
    }

    #[test]
    fn solid_theme_only_adjusts_fonts() {
        let mut doc = Document::parse_fragment("<h1>Party \u{1F389}</h1>", "article");
        let root = doc.root();
        let style = solid_style();
        apply(&mut doc, root, &style);
        let html = doc.inner_html(root);
        assert!(!html.contains("data-emoji"));
        assert!(html.contains("Apple Color Emoji"));
    }

    #[test]
    fn revert_after_apply_is_byte_identical() {
        let source = "<h1 style=\"color: red\">Hi \u{1F389}</h1><p>Plain \u{2728} text</p>";
        let mut doc = Document::parse_fragment(source, "article");
        let root = doc.root();
        let before = doc.inner_html(root);
        let style = gradient_style();

        let token = apply(&mut doc, root, &style);
        assert_ne!(doc.inner_html(root), before);

        token.revert(&mut doc);
        assert_eq!(doc.inner_html(root), before);
    }

    #[test]
    fn nodes_without_emoji_are_untouched() {
        let mut doc = Document::parse_fragment("<h1>No glyphs here</h1>", "article");
        let root = doc.root();
        let before = doc.inner_html(root);
        let token = apply(&mut doc, root, &gradient_style());
        assert!(token.is_empty());
        assert_eq!(doc.inner_html(root), before);
    }

    #[test]
    fn text_presentation_selector_stays_in_the_marker() {
        let mut doc = Document::parse_fragment("<h1>Sun \u{2600}\u{FE0E}</h1>", "article");
        let root = doc.root();
        apply(&mut doc, root, &gradient_style());
        let html = doc.inner_html(root);
        assert_eq!(html.matches("data-emoji").count(), 1);
        assert!(html.contains("\u{2600}\u{FE0E}</span>"), "selector split out: {}", html);
    }

    #[test]
    fn export_stylesheet_is_scoped() {
        let mut doc = Document::with_root("article");
        let id = insert_export_stylesheet(&mut doc);
        assert_eq!(doc.stylesheets().count(), 1);
        remove_export_stylesheet(&mut doc, id);
        assert_eq!(doc.stylesheets().count(), 0);
    }
}
