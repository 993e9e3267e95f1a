//! Paint command generation from a laid-out document.

use crate::render::layout::{BlockKind, DocumentLayout, Rect};
use crate::style::EffectiveStyle;

/// RGBA color, straight alpha.
pub type Rgba = [u8; 4];

/// Background fill composited beneath the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Solid(Rgba),
    /// Linear top-to-bottom gradient over the full content height.
    VerticalGradient(Rgba, Rgba),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        rect: Rect,
        color: Rgba,
    },
    TextRun {
        x: i32,
        y: i32,
        text: String,
        color: Rgba,
        font_px: u32,
    },
}

/// Best-effort CSS color parsing: hex forms plus a few keywords.
/// Unparseable values fall back to `fallback` (free-form color strings are
/// accepted unvalidated upstream).
pub fn parse_color(value: &str, fallback: Rgba) -> Rgba {
    let v = value.trim();
    if let Some(hex) = v.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .filter_map(|c| c.to_digit(16).map(|d| d as u8))
            .collect();
        match (hex.len(), digits.len()) {
            (3, 3) => {
                return [
                    digits[0] * 17,
                    digits[1] * 17,
                    digits[2] * 17,
                    255,
                ]
            }
            (6, 6) => {
                return [
                    digits[0] * 16 + digits[1],
                    digits[2] * 16 + digits[3],
                    digits[4] * 16 + digits[5],
                    255,
                ]
            }
            _ => return fallback,
        }
    }
    match v.to_ascii_lowercase().as_str() {
        "white" => [255, 255, 255, 255],
        "black" => [0, 0, 0, 255],
        "transparent" | "none" => [0, 0, 0, 0],
        _ => fallback,
    }
}

/// Resolve the document background fill from the effective style.
pub fn background_fill(style: &EffectiveStyle) -> Fill {
    let start = parse_color(&style.background_start, [255, 255, 255, 255]);
    if style.is_gradient() {
        let end = parse_color(&style.background_end, start);
        Fill::VerticalGradient(start, end)
    } else {
        Fill::Solid(start)
    }
}

/// Build the flat paint list for a laid-out document.
pub fn build_commands(layout: &DocumentLayout, style: &EffectiveStyle) -> Vec<PaintCommand> {
    let body = parse_color(&style.body_color, [44, 62, 80, 255]);
    let heading = parse_color(&style.heading_color, body);
    let border = parse_color(&style.border_color, [234, 236, 239, 255]);
    let accent = parse_color(&style.accent_color, border);
    let pre_bg = parse_color(&style.pre_background, [248, 250, 252, 255]);
    let pre_fg = parse_color(&style.pre_code_color, body);
    let quote_bg = parse_color(&style.blockquote_background, pre_bg);
    let quote_fg = parse_color(&style.blockquote_color, body);
    let table_border = parse_color(&style.table_border_color, border);
    let table_head_bg = parse_color(&style.table_header_background, pre_bg);
    let table_head_fg = parse_color(&style.table_header_color, heading);
    let table_stripe = parse_color(&style.table_stripe_background, quote_bg);

    let mut cmds = Vec::new();
    for block in &layout.blocks {
        let pad: i32 = match block.kind {
            BlockKind::CodeBlock => 18,
            BlockKind::Blockquote => 16,
            BlockKind::Heading(_) => 8,
            BlockKind::TableRow { .. } => 6,
            _ => 4,
        };

        // Block backgrounds and borders first, text on top.
        match &block.kind {
            BlockKind::CodeBlock => cmds.push(PaintCommand::SolidRect {
                rect: block.rect,
                color: pre_bg,
            }),
            BlockKind::Blockquote => cmds.push(PaintCommand::SolidRect {
                rect: block.rect,
                color: quote_bg,
            }),
            BlockKind::Rule => cmds.push(PaintCommand::SolidRect {
                rect: block.rect,
                color: border,
            }),
            BlockKind::TableRow { header, stripe } => {
                if *header {
                    cmds.push(PaintCommand::SolidRect {
                        rect: block.rect,
                        color: table_head_bg,
                    });
                } else if *stripe {
                    cmds.push(PaintCommand::SolidRect {
                        rect: block.rect,
                        color: table_stripe,
                    });
                }
                // Row separator.
                cmds.push(PaintCommand::SolidRect {
                    rect: Rect {
                        x: block.rect.x,
                        y: block.rect.y + block.rect.height as i32 - 1,
                        width: block.rect.width,
                        height: 1,
                    },
                    color: table_border,
                });
            }
            BlockKind::Heading(level) if *level <= 2 => {
                // Headings carry the underline the preview CSS draws.
                cmds.push(PaintCommand::SolidRect {
                    rect: Rect {
                        x: block.rect.x,
                        y: block.rect.y + block.rect.height as i32 - 2,
                        width: block.rect.width,
                        height: 2,
                    },
                    color: border,
                });
            }
            BlockKind::ListItem => {
                let bullet = (block.font_px / 3).max(2);
                cmds.push(PaintCommand::SolidRect {
                    rect: Rect {
                        x: block.rect.x - bullet as i32 * 2,
                        y: block.rect.y + pad + (block.font_px / 2) as i32,
                        width: bullet,
                        height: bullet,
                    },
                    color: accent,
                });
            }
            BlockKind::Overlay | BlockKind::Heading(_) | BlockKind::Paragraph => {}
        }

        if block.kind == BlockKind::Overlay {
            // Chrome is painted only while visible in the preview; exports
            // hide these nodes before layout so they never reach here during
            // an export run.
            cmds.push(PaintCommand::SolidRect {
                rect: block.rect,
                color: [255, 77, 79, 200],
            });
            continue;
        }

        let color = match &block.kind {
            BlockKind::Heading(_) => heading,
            BlockKind::CodeBlock => pre_fg,
            BlockKind::Blockquote => quote_fg,
            BlockKind::TableRow { header, .. } => {
                if *header {
                    table_head_fg
                } else {
                    body
                }
            }
            _ => body,
        };

        let line_height = (block.font_px * 18 / 10) as i32;
        for (i, line) in block.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            cmds.push(PaintCommand::TextRun {
                x: block.rect.x + pad,
                y: block.rect.y + pad + i as i32 * line_height,
                text: line.clone(),
                color,
                font_px: block.font_px,
            });
        }
    }
    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::render::layout::layout_document;
    use crate::style::StyleOverrides;
    use crate::theme;

    #[test]
    fn parse_color_hex_forms() {
        assert_eq!(parse_color("#ffffff", [0; 4]), [255, 255, 255, 255]);
        assert_eq!(parse_color("#f00", [0; 4]), [255, 0, 0, 255]);
        assert_eq!(parse_color("#2c3e50", [0; 4]), [44, 62, 80, 255]);
        assert_eq!(parse_color("not-a-color", [1, 2, 3, 4]), [1, 2, 3, 4]);
        assert_eq!(parse_color("transparent", [1, 2, 3, 4]), [0, 0, 0, 0]);
    }

    #[test]
    fn commands_cover_text_and_chrome() {
        let style = StyleOverrides::default().effective(&theme::resolve("light"));
        let doc = Document::parse_fragment("<h1>Title</h1><pre>code</pre>", "article");
        let layout = layout_document(&doc, doc.root(), &style, 720);
        let cmds = build_commands(&layout, &style);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, PaintCommand::TextRun { text, .. } if text == "Title")));
        assert!(cmds
            .iter()
            .any(|c| matches!(c, PaintCommand::SolidRect { .. })));
    }

    #[test]
    fn gradient_background_fill() {
        let tokens = theme::resolve("light");
        let mut ovr = StyleOverrides::default();
        ovr.set_background_start("#000000");
        ovr.set_background_end("#ffffff");
        let fill = background_fill(&ovr.effective(&tokens));
        assert!(matches!(fill, Fill::VerticalGradient(..)));
    }
}
