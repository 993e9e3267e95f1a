//! Block layout for the preview document.
//!
//! A deliberately small layout pass: blocks stack vertically inside the
//! content box, text wraps on an estimated per-character advance, and
//! absolutely positioned overlay elements (cutting chrome) take no vertical
//! space. The numbers are integer and deterministic so raster output is
//! stable across runs.

use crate::dom::{Document, NodeId};
use crate::style::EffectiveStyle;

/// Horizontal padding of the preview content box.
pub const PAD_X: u32 = 60;
/// Vertical padding of the preview content box.
pub const PAD_Y: u32 = 48;

const BLOCK_GAP: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
    CodeBlock,
    Blockquote,
    ListItem,
    TableRow { header: bool, stripe: bool },
    Rule,
    /// Absolutely positioned chrome (cut-line markers, banner).
    Overlay,
}

/// One laid-out block: its rect, wrapped text lines, and type.
#[derive(Debug, Clone)]
pub struct LayoutBlock {
    pub node: NodeId,
    pub rect: Rect,
    pub kind: BlockKind,
    pub lines: Vec<String>,
    pub font_px: u32,
}

/// The measured document: blocks in paint order plus the content box size.
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub blocks: Vec<LayoutBlock>,
    pub content_width: u32,
    pub content_height: u32,
}

/// Lay out the subtree under `root` at the given content-box width.
pub fn layout_document(
    doc: &Document,
    root: NodeId,
    style: &EffectiveStyle,
    width: u32,
) -> DocumentLayout {
    let inner_width = width.saturating_sub(PAD_X * 2).max(1);
    let mut ctx = LayoutCtx {
        doc,
        style,
        inner_width,
        y: PAD_Y,
        blocks: Vec::new(),
    };

    for child in doc.children(root) {
        ctx.layout_block(*child, 0);
    }

    let content_height = ctx.y + PAD_Y;
    DocumentLayout {
        blocks: ctx.blocks,
        content_width: width,
        content_height,
    }
}

struct LayoutCtx<'a> {
    doc: &'a Document,
    style: &'a EffectiveStyle,
    inner_width: u32,
    y: u32,
    blocks: Vec<LayoutBlock>,
}

impl LayoutCtx<'_> {
    fn layout_block(&mut self, node: NodeId, indent: u32) {
        let Some(el) = self.doc.element(node) else { return };
        if el.style.get("display") == Some("none") {
            return;
        }

        // Overlay chrome keeps its own coordinates and consumes no flow space.
        if el.style.get("position") == Some("absolute") {
            let top = el
                .style
                .get("top")
                .and_then(parse_px)
                .unwrap_or(0);
            let height = el
                .style
                .get("height")
                .and_then(parse_px)
                .unwrap_or(2) as u32;
            self.blocks.push(LayoutBlock {
                node,
                rect: Rect {
                    x: 0,
                    y: top,
                    width: self.inner_width + PAD_X * 2,
                    height,
                },
                kind: BlockKind::Overlay,
                lines: vec![self.doc.text_content(node)],
                font_px: self.style.body_size as u32,
            });
            return;
        }

        let tag = el.tag.as_str();
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag.as_bytes()[1] - b'0';
                let font_px = self.style.heading_px(level).round() as u32;
                self.flow_text(node, BlockKind::Heading(level.min(3)), font_px, indent, 8);
            }
            "p" => {
                let font_px = self.style.body_size.round() as u32;
                self.flow_text(node, BlockKind::Paragraph, font_px, indent, 4);
            }
            "pre" => {
                let font_px = self.style.code_size.round() as u32;
                self.flow_pre(node, font_px, indent);
            }
            "blockquote" => {
                let font_px = self.style.body_size.round() as u32;
                self.flow_text(node, BlockKind::Blockquote, font_px, indent, 16);
            }
            "ul" | "ol" => {
                for child in self.doc.children(node) {
                    self.layout_block(*child, indent + 20);
                }
            }
            "li" => {
                let font_px = self.style.body_size.round() as u32;
                self.flow_text(node, BlockKind::ListItem, font_px, indent, 2);
            }
            "table" => self.flow_table(node, indent),
            "hr" => {
                self.blocks.push(LayoutBlock {
                    node,
                    rect: Rect {
                        x: (PAD_X + indent) as i32,
                        y: self.y as i32,
                        width: self.inner_width.saturating_sub(indent),
                        height: 2,
                    },
                    kind: BlockKind::Rule,
                    lines: Vec::new(),
                    font_px: 0,
                });
                self.y += 2 + BLOCK_GAP;
            }
            // Containers produced by some renderers; recurse into them.
            "div" | "section" | "thead" | "tbody" | "article" => {
                for child in self.doc.children(node) {
                    self.layout_block(*child, indent);
                }
            }
            _ => {
                let text = self.doc.text_content(node);
                if !text.trim().is_empty() {
                    let font_px = self.style.body_size.round() as u32;
                    self.flow_text(node, BlockKind::Paragraph, font_px, indent, 4);
                }
            }
        }
    }

    fn flow_text(&mut self, node: NodeId, kind: BlockKind, font_px: u32, indent: u32, pad: u32) {
        let text = normalize_ws(&self.doc.text_content(node));
        if text.is_empty() {
            return;
        }
        let avail = self.inner_width.saturating_sub(indent + pad * 2).max(1);
        let lines = wrap_text(&text, chars_per_line(avail, font_px));
        let height = lines.len() as u32 * line_height(font_px) + pad * 2;
        self.blocks.push(LayoutBlock {
            node,
            rect: Rect {
                x: (PAD_X + indent) as i32,
                y: self.y as i32,
                width: self.inner_width.saturating_sub(indent),
                height,
            },
            kind,
            lines,
            font_px,
        });
        self.y += height + BLOCK_GAP;
    }

    fn flow_pre(&mut self, node: NodeId, font_px: u32, indent: u32) {
        let text = self.doc.text_content(node);
        let lines: Vec<String> = text
            .lines()
            .map(str::to_string)
            .collect();
        let count = lines.len().max(1) as u32;
        let pad = 18;
        let height = count * line_height(font_px) + pad * 2;
        self.blocks.push(LayoutBlock {
            node,
            rect: Rect {
                x: (PAD_X + indent) as i32,
                y: self.y as i32,
                width: self.inner_width.saturating_sub(indent),
                height,
            },
            kind: BlockKind::CodeBlock,
            lines,
            font_px,
        });
        self.y += height + BLOCK_GAP;
    }

    fn flow_table(&mut self, node: NodeId, indent: u32) {
        let font_px = self.style.table_size.round() as u32;
        let mut rows: Vec<(NodeId, bool)> = Vec::new();
        collect_rows(self.doc, node, false, &mut rows);
        let mut stripe = false;
        for (row, header) in rows {
            let cells: Vec<String> = self
                .doc
                .children(row)
                .iter()
                .map(|c| normalize_ws(&self.doc.text_content(*c)))
                .collect();
            let text = cells.join("  |  ");
            let pad = 6;
            let height = line_height(font_px) + pad * 2;
            self.blocks.push(LayoutBlock {
                node: row,
                rect: Rect {
                    x: (PAD_X + indent) as i32,
                    y: self.y as i32,
                    width: self.inner_width.saturating_sub(indent),
                    height,
                },
                kind: BlockKind::TableRow {
                    header,
                    stripe: !header && stripe,
                },
                lines: vec![text],
                font_px,
            });
            self.y += height;
            if !header {
                stripe = !stripe;
            }
        }
        self.y += BLOCK_GAP;
    }
}

fn collect_rows(doc: &Document, node: NodeId, in_head: bool, out: &mut Vec<(NodeId, bool)>) {
    for child in doc.children(node) {
        let Some(el) = doc.element(*child) else { continue };
        match el.tag.as_str() {
            "tr" => out.push((*child, in_head)),
            "thead" => collect_rows(doc, *child, true, out),
            "tbody" => collect_rows(doc, *child, false, out),
            _ => collect_rows(doc, *child, in_head, out),
        }
    }
}

fn parse_px(v: &str) -> Option<i32> {
    v.trim().trim_end_matches("px").trim().parse().ok()
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Estimated character advance: 6/10 of the font size.
fn chars_per_line(avail: u32, font_px: u32) -> usize {
    let advance = (font_px * 6 / 10).max(1);
    (avail / advance).max(1) as usize
}

// Matches the preview's 1.8 line-height.
fn line_height(font_px: u32) -> u32 {
    font_px * 18 / 10
}

fn wrap_text(text: &str, chars_per_line: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if !cur.is_empty() && cur.chars().count() + 1 + word.chars().count() > chars_per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}
