//! Software rasterization of paint commands into PNG bytes.
//!
//! Text is drawn as solid ink boxes per glyph cell; this is not a type
//! renderer, but it is deterministic, respects colors and metrics, and is
//! enough for pixel-accurate segment math and golden tests.

use crate::error::{Error, Result};
use crate::render::paint::{Fill, PaintCommand, Rgba};

/// An RGBA8 pixel buffer.
#[derive(Debug, Clone)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Pixmap {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = ((y as usize) * self.width as usize + x as usize) * 4;
        let a = color[3] as u32;
        if a == 255 {
            self.data[idx..idx + 4].copy_from_slice(&color);
            return;
        }
        for c in 0..3 {
            let dst = self.data[idx + c] as u32;
            self.data[idx + c] = ((color[c] as u32 * a + dst * (255 - a)) / 255) as u8;
        }
        let dst_a = self.data[idx + 3] as u32;
        self.data[idx + 3] = (a + dst_a * (255 - a) / 255) as u8;
    }

    fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgba) {
        for py in y.max(0)..(y + h).min(self.height as i64) {
            for px in x.max(0)..(x + w).min(self.width as i64) {
                self.blend_pixel(px, py, color);
            }
        }
    }
}

/// Rasterize a command list into a `width*scale x height*scale` pixmap.
///
/// `translate_y` shifts content up by that many unscaled pixels before
/// scaling, which is how segment export selects its vertical slice. A
/// gradient background spans `background_height` document pixels and is
/// offset by the same translation, so adjacent slices of one document join
/// without a seam.
pub fn rasterize(
    commands: &[PaintCommand],
    width: u32,
    height: u32,
    background: Fill,
    scale: u32,
    translate_y: i32,
    background_height: u32,
) -> Pixmap {
    let out_w = width * scale;
    let out_h = height * scale;
    let mut pm = Pixmap::new(out_w, out_h);

    match background {
        Fill::Solid(color) => pm.fill_rect(0, 0, out_w as i64, out_h as i64, opaque(color)),
        Fill::VerticalGradient(start, end) => {
            let span = background_height.max(1);
            for row in 0..out_h {
                let doc_y = row as f32 / scale as f32 + translate_y as f32;
                let t = if span > 1 {
                    (doc_y / (span - 1) as f32).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                pm.fill_rect(0, row as i64, out_w as i64, 1, opaque(lerp(start, end, t)));
            }
        }
    }

    let s = scale as i64;
    let ty = translate_y as i64;
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { rect, color } => {
                pm.fill_rect(
                    rect.x as i64 * s,
                    (rect.y as i64 - ty) * s,
                    rect.width as i64 * s,
                    rect.height as i64 * s,
                    *color,
                );
            }
            PaintCommand::TextRun {
                x,
                y,
                text,
                color,
                font_px,
            } => {
                let advance = (*font_px as i64 * 6 / 10).max(1);
                let ink_h = (*font_px as i64 * 7 / 10).max(1);
                let mut cx = *x as i64;
                for c in text.chars() {
                    if !c.is_whitespace() {
                        pm.fill_rect(
                            cx * s,
                            (*y as i64 - ty + (*font_px as i64 - ink_h) / 2) * s,
                            (advance - 1).max(1) * s,
                            ink_h * s,
                            *color,
                        );
                    }
                    cx += advance;
                }
            }
        }
    }

    pm
}

fn opaque(c: Rgba) -> Rgba {
    [c[0], c[1], c[2], 255]
}

fn lerp(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8;
    }
    out
}

/// Encode a pixmap as PNG bytes.
pub fn encode_png(pm: &Pixmap) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut out);
    image::ImageEncoder::write_image(
        encoder,
        pm.data(),
        pm.width,
        pm.height,
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|e| Error::Raster(format!("PNG encoding failed: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::Rect;

    #[test]
    fn output_scales_with_supersample() {
        let pm = rasterize(&[], 400, 300, Fill::Solid([255, 255, 255, 255]), 2, 0, 300);
        assert_eq!(pm.width, 800);
        assert_eq!(pm.height, 600);
    }

    #[test]
    fn background_is_composited() {
        let pm = rasterize(&[], 4, 4, Fill::Solid([10, 20, 30, 255]), 1, 0, 4);
        assert_eq!(&pm.data()[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn translate_selects_vertical_slice() {
        let cmds = vec![PaintCommand::SolidRect {
            rect: Rect {
                x: 0,
                y: 10,
                width: 2,
                height: 2,
            },
            color: [255, 0, 0, 255],
        }];
        // Without translation the rect is out of a 4px-tall view...
        let top = rasterize(&cmds, 2, 4, Fill::Solid([0, 0, 0, 255]), 1, 0, 12);
        assert_eq!(&top.data()[0..3], &[0, 0, 0]);
        // ...translated by 10 it lands at the top.
        let shifted = rasterize(&cmds, 2, 4, Fill::Solid([0, 0, 0, 255]), 1, 10, 12);
        assert_eq!(&shifted.data()[0..3], &[255, 0, 0]);
    }

    #[test]
    fn gradient_endpoints() {
        let pm = rasterize(
            &[],
            1,
            2,
            Fill::VerticalGradient([0, 0, 0, 255], [255, 255, 255, 255]),
            1,
            0,
            2,
        );
        assert_eq!(&pm.data()[0..3], &[0, 0, 0]);
        assert_eq!(&pm.data()[4..7], &[255, 255, 255]);
    }

    #[test]
    fn gradient_is_continuous_across_slices() {
        let grad = Fill::VerticalGradient([0, 0, 0, 255], [255, 255, 255, 255]);
        // Two 100px slices of one 200px document.
        let top = rasterize(&[], 1, 100, grad, 1, 0, 200);
        let bottom = rasterize(&[], 1, 100, grad, 1, 100, 200);

        // Slice edges carry the document endpoints...
        assert_eq!(&top.data()[0..3], &[0, 0, 0]);
        let last = bottom.data().len() - 4;
        assert_eq!(&bottom.data()[last..last + 3], &[255, 255, 255]);

        // ...and the join is a single gradient step, not a restart.
        let top_last = top.data().len() - 4;
        let a = top.data()[top_last] as i32;
        let b = bottom.data()[0] as i32;
        assert!((a - b).abs() <= 2, "seam at the cut: {} vs {}", a, b);
    }

    #[test]
    fn png_encoding_produces_signature() {
        let pm = rasterize(&[], 8, 8, Fill::Solid([255, 255, 255, 255]), 1, 0, 8);
        let png = encode_png(&pm).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }
}
