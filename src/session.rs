//! The editing session: source text, theme, overrides, cut lines, and the
//! export orchestration that ties them together.
//!
//! A [`Session`] owns the markup renderer and the rasterization adapter. It is
//! synchronous and single-threaded; [`crate::async_api::Studio`] wraps it in a
//! worker thread for async callers.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::export::{self, CancelToken, CutLineSet, DownloadSink, ExportOptions, ExportReport};
use crate::markdown::MarkupRenderer;
use crate::render::Rasterizer;
use crate::style::{EffectiveStyle, StyleOverrides};
use crate::theme::{self, ThemeTokens};
use crate::title;
use crate::{emoji, render};

/// Attribute marking editing chrome that must never appear in exports.
pub const CHROME_ATTR: &str = "data-chrome";

/// Session tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Preview content-box width in CSS pixels.
    pub preview_width: u32,
    /// Scale factor for full-image exports.
    pub supersample: u32,
    /// Pacing delay between segment deliveries.
    pub download_delay_ms: u64,
    /// Watchdog timeout for a single rasterization.
    pub raster_timeout_ms: u64,
    /// Initial theme name.
    pub theme: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            preview_width: 720,
            supersample: 2,
            download_delay_ms: 500,
            raster_timeout_ms: 30_000,
            theme: theme::DEFAULT_THEME.to_string(),
        }
    }
}

/// Whether cut-line placement is live on the preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutMode {
    #[default]
    Idle,
    CuttingActive,
}

/// A rendered preview: the document tree plus its measured size.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub doc: Document,
    pub root: NodeId,
    pub width: u32,
    pub height: u32,
}

pub struct Session {
    config: SessionConfig,
    source: String,
    theme_name: String,
    tokens: ThemeTokens,
    overrides: StyleOverrides,
    cuts: CutLineSet,
    mode: CutMode,
    renderer: Box<dyn MarkupRenderer>,
    rasterizer: Rasterizer,
    busy: bool,
    // Height of the last rendered preview, for cut-line validation.
    preview_height: Option<u32>,
}

impl Session {
    pub fn new(config: SessionConfig, renderer: Box<dyn MarkupRenderer>) -> Self {
        let tokens = theme::resolve(&config.theme);
        let mut overrides = StyleOverrides::default();
        overrides.apply_theme(&tokens);
        let rasterizer = Rasterizer::software(config.raster_timeout_ms);
        Session {
            theme_name: config.theme.clone(),
            config,
            source: String::new(),
            tokens,
            overrides,
            cuts: CutLineSet::default(),
            mode: CutMode::Idle,
            renderer,
            rasterizer,
            busy: false,
            preview_height: None,
        }
    }

    /// Replace the built-in rasterization adapter (test seam).
    pub fn set_rasterizer(&mut self, rasterizer: Rasterizer) {
        self.rasterizer = rasterizer;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, text: &str) {
        self.source = text.to_string();
        self.preview_height = None;
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// Switch to a built-in theme, resetting the default-sourced style fields.
    pub fn set_theme(&mut self, name: &str) {
        self.tokens = theme::resolve(name);
        self.theme_name = name.to_string();
        self.overrides.apply_theme(&self.tokens);
        self.preview_height = None;
        info!("theme switched to {}", name);
    }

    /// Install a custom token set in place of a built-in theme.
    pub fn set_theme_tokens(&mut self, name: &str, tokens: ThemeTokens) {
        self.tokens = tokens;
        self.theme_name = name.to_string();
        self.overrides.apply_theme(&self.tokens);
        self.preview_height = None;
    }

    pub fn overrides(&self) -> &StyleOverrides {
        &self.overrides
    }

    /// Mutable access to the override store. Invalidates the cached preview
    /// height, since font-size changes move every cut boundary target.
    pub fn overrides_mut(&mut self) -> &mut StyleOverrides {
        self.preview_height = None;
        &mut self.overrides
    }

    pub fn cut_mode(&self) -> CutMode {
        self.mode
    }

    pub fn cut_lines(&self) -> &[u32] {
        self.cuts.positions()
    }

    /// Toggle cut-line placement. Entering cutting mode starts from a clean
    /// slate; leaving it keeps the placed lines for the next export.
    pub fn toggle_cutting(&mut self) -> CutMode {
        self.mode = match self.mode {
            CutMode::Idle => {
                self.cuts.clear();
                CutMode::CuttingActive
            }
            CutMode::CuttingActive => CutMode::Idle,
        };
        self.mode
    }

    /// Place a cut line at document pixel `y`. Only valid while cutting.
    pub fn add_cut_line(&mut self, y: u32) -> Result<()> {
        if self.mode != CutMode::CuttingActive {
            return Err(Error::InvalidCutLine {
                y,
                reason: "cutting mode is not active",
            });
        }
        let height = self.measured_height()?;
        self.cuts.insert(y, height)?;
        debug!("cut line placed at y={} (doc height {})", y, height);
        Ok(())
    }

    pub fn remove_cut_line(&mut self, y: u32) -> bool {
        self.cuts.remove(y)
    }

    pub fn clear_cut_lines(&mut self) {
        self.cuts.clear();
    }

    fn effective_style(&self) -> EffectiveStyle {
        self.overrides.effective(&self.tokens)
    }

    fn measured_height(&mut self) -> Result<u32> {
        if let Some(h) = self.preview_height {
            return Ok(h);
        }
        let frame = self.render_preview()?;
        self.preview_height = Some(frame.height);
        Ok(frame.height)
    }

    /// Render the current source into a preview frame.
    ///
    /// While cutting is active the frame carries the editing chrome: a banner
    /// plus one absolutely positioned marker per placed cut line, all tagged
    /// so exports can hide them.
    pub fn render_preview(&self) -> Result<PreviewFrame> {
        let mut doc = self.renderer.render(&self.source)?;
        let root = doc.root();
        if self.mode == CutMode::CuttingActive {
            self.decorate_cutting_chrome(&mut doc, root);
        }
        let style = self.effective_style();
        let layout = render::layout::layout_document(&doc, root, &style, self.config.preview_width);
        Ok(PreviewFrame {
            doc,
            root,
            width: self.config.preview_width,
            height: layout.content_height,
        })
    }

    fn decorate_cutting_chrome(&self, doc: &mut Document, root: NodeId) {
        if let Some(el) = doc.element_mut(root) {
            el.style.set("cursor", "crosshair");
            el.style.set("outline", "2px dashed #ff4d4f");
        }

        let banner = doc.create_element("div");
        if let Some(el) = doc.element_mut(banner) {
            el.set_attr(CHROME_ATTR, "banner");
            el.style.set("position", "absolute");
            el.style.set("top", "0px");
            el.style.set("height", "28px");
        }
        let label = doc.create_text("Click to place a cut line");
        doc.append_child(banner, label);
        doc.append_child(root, banner);

        for y in self.cuts.positions() {
            let marker = doc.create_element("div");
            if let Some(el) = doc.element_mut(marker) {
                el.set_attr(CHROME_ATTR, "cut-line");
                el.style.set("position", "absolute");
                el.style.set("top", &format!("{}px", y));
                el.style.set("height", "2px");
            }
            doc.append_child(root, marker);
        }
    }

    /// Export the current document through `sink`.
    ///
    /// Renders a fresh frame, hides the editing chrome, normalizes emoji,
    /// runs the segment loop, then unwinds every mutation in reverse order
    /// whether the loop succeeded or not. Rejects re-entry while a run is in
    /// flight.
    pub fn export(
        &mut self,
        sink: &mut dyn DownloadSink,
        cancel: &CancelToken,
    ) -> Result<ExportReport> {
        if self.busy {
            return Err(Error::Busy);
        }
        self.busy = true;
        let result = self.export_inner(sink, cancel);
        self.busy = false;
        result
    }

    fn export_inner(
        &mut self,
        sink: &mut dyn DownloadSink,
        cancel: &CancelToken,
    ) -> Result<ExportReport> {
        let mut frame = self.render_preview()?;
        self.preview_height = Some(frame.height);
        if frame.height == 0 {
            return Err(Error::ZeroSize);
        }
        let style = self.effective_style();
        let base = title::derive(&self.source);
        let segments = export::plan_segments(&self.cuts, frame.height, &base);
        info!(
            "exporting {} segment(s) of a {}x{} document as {}",
            segments.len(),
            frame.width,
            frame.height,
            base
        );

        let hidden = hide_chrome(&mut frame.doc, frame.root);
        let undo = emoji::apply(&mut frame.doc, frame.root, &style);
        let sheet = emoji::insert_export_stylesheet(&mut frame.doc);

        let result = export::run(
            &mut self.rasterizer,
            &frame.doc,
            frame.root,
            &style,
            &segments,
            &ExportOptions {
                width_px: frame.width,
                supersample: self.config.supersample,
                delay_ms: self.config.download_delay_ms,
            },
            sink,
            cancel,
        );

        // Unwind in reverse order of acquisition, on every path.
        emoji::remove_export_stylesheet(&mut frame.doc, sheet);
        undo.revert(&mut frame.doc);
        restore_chrome(&mut frame.doc, hidden);

        result
    }
}

struct HiddenChrome {
    nodes: Vec<(NodeId, Option<String>)>,
    root: NodeId,
    root_cursor: Option<String>,
    root_outline: Option<String>,
}

/// Hide every chrome-tagged element and strip the container's cutting
/// cursor/outline, recording prior values for restoration.
fn hide_chrome(doc: &mut Document, root: NodeId) -> HiddenChrome {
    let targets: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .filter(|n| doc.element(*n).is_some_and(|el| el.attr(CHROME_ATTR).is_some()))
        .collect();
    let mut nodes = Vec::with_capacity(targets.len());
    for node in targets {
        if let Some(el) = doc.element_mut(node) {
            let prev = el.style.get("display").map(str::to_string);
            el.style.set("display", "none");
            nodes.push((node, prev));
        }
    }
    let (root_cursor, root_outline) = match doc.element_mut(root) {
        Some(el) => (el.style.remove("cursor"), el.style.remove("outline")),
        None => (None, None),
    };
    HiddenChrome {
        nodes,
        root,
        root_cursor,
        root_outline,
    }
}

fn restore_chrome(doc: &mut Document, hidden: HiddenChrome) {
    if let Some(el) = doc.element_mut(hidden.root) {
        if let Some(v) = hidden.root_cursor {
            el.style.set("cursor", &v);
        }
        if let Some(v) = hidden.root_outline {
            el.style.set("outline", &v);
        }
    }
    for (node, prev) in hidden.nodes.into_iter().rev() {
        if let Some(el) = doc.element_mut(node) {
            match prev {
                Some(v) => el.style.set("display", &v),
                None => {
                    el.style.remove("display");
                }
            }
        }
    }
}
