//! Segment planning and the export engine.
//!
//! Cut lines partition the preview into vertical segments; the engine turns
//! each segment into a PNG through the rasterization adapter and hands it to a
//! [`DownloadSink`]. Delivery is sequential with a pacing delay between
//! segments, cancellable at segment granularity.

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use log::{debug, info};

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::render::{paint, RasterOptions, Rasterizer};
use crate::style::EffectiveStyle;

/// Pixel ratio used for segment captures, matching the full-image default.
const SEGMENT_PIXEL_RATIO: u32 = 2;

/// The set of active horizontal cut lines, in document pixels.
///
/// Kept sorted; invalid positions are rejected at insertion so the set never
/// holds a line the segment planner would have to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutLineSet {
    lines: Vec<u32>,
}

impl CutLineSet {
    /// Insert a cut line at `y` against a document of height `height`.
    ///
    /// Rejects duplicates and positions that would produce an empty segment
    /// (the top edge, the bottom edge, or beyond).
    pub fn insert(&mut self, y: u32, height: u32) -> Result<()> {
        if y == 0 {
            return Err(Error::InvalidCutLine {
                y,
                reason: "cut at the top edge would produce an empty segment",
            });
        }
        if y >= height {
            return Err(Error::InvalidCutLine {
                y,
                reason: "cut at or below the bottom edge would produce an empty segment",
            });
        }
        match self.lines.binary_search(&y) {
            Ok(_) => Err(Error::InvalidCutLine {
                y,
                reason: "a cut line already exists at this position",
            }),
            Err(idx) => {
                self.lines.insert(idx, y);
                Ok(())
            }
        }
    }

    /// Remove the line at exactly `y`; reports whether one was present.
    pub fn remove(&mut self, y: u32) -> bool {
        match self.lines.binary_search(&y) {
            Ok(idx) => {
                self.lines.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The sorted cut positions.
    pub fn positions(&self) -> &[u32] {
        &self.lines
    }
}

/// One planned slice of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_y: u32,
    pub end_y: u32,
    pub filename: String,
}

impl Segment {
    pub fn height(&self) -> u32 {
        self.end_y - self.start_y
    }
}

/// Plan the segment list for a document of height `height`.
///
/// With no cuts the whole document is one segment named `<base>.png`; with
/// cuts every segment (including the first) is numbered `<base>-<k>.png`
/// starting at 1.
pub fn plan_segments(cuts: &CutLineSet, height: u32, base: &str) -> Vec<Segment> {
    if cuts.is_empty() {
        return vec![Segment {
            start_y: 0,
            end_y: height,
            filename: format!("{}.png", base),
        }];
    }
    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0);
    bounds.extend_from_slice(cuts.positions());
    bounds.push(height);

    bounds
        .windows(2)
        .enumerate()
        .map(|(i, pair)| Segment {
            start_y: pair[0],
            end_y: pair[1],
            filename: format!("{}-{}.png", base, i + 1),
        })
        .collect()
}

/// Destination for produced files.
pub trait DownloadSink {
    fn deliver(&mut self, filename: &str, png_data: &[u8]) -> Result<()>;
}

/// Writes each file into a directory.
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsSink { dir: dir.into() }
    }
}

impl DownloadSink for FsSink {
    fn deliver(&mut self, filename: &str, png_data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        let mut file = fs::File::create(&path)?;
        file.write_all(png_data)?;
        debug!("wrote {} ({} bytes)", path.display(), png_data.len());
        Ok(())
    }
}

/// Collects files in memory; the test sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, filename: &str, png_data: &[u8]) -> Result<()> {
        self.files.push((filename.to_string(), png_data.to_vec()));
        Ok(())
    }
}

/// Collects `data:image/png;base64,...` URLs, the browser-download shape.
#[derive(Debug, Default)]
pub struct DataUrlSink {
    pub urls: Vec<(String, String)>,
}

impl DownloadSink for DataUrlSink {
    fn deliver(&mut self, filename: &str, png_data: &[u8]) -> Result<()> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_data);
        self.urls
            .push((filename.to_string(), format!("data:image/png;base64,{}", encoded)));
        Ok(())
    }
}

/// Cooperative cancellation flag shared between the export loop and callers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another export.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// What an export run produced.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub files: Vec<String>,
}

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub width_px: u32,
    /// Scale factor for a single-image export; segment captures always use
    /// the fixed segment pixel ratio.
    pub supersample: u32,
    /// Pacing delay inserted between segment deliveries, not after the last.
    pub delay_ms: u64,
}

/// Run the export loop over a planned segment list.
///
/// Segments are rasterized and delivered in order. Cancellation is observed
/// between segments. A failure after at least one delivery surfaces as
/// [`Error::PartialSegmentFailure`] so the caller knows which files landed.
#[allow(clippy::too_many_arguments)]
pub fn run(
    rasterizer: &mut Rasterizer,
    doc: &Document,
    root: NodeId,
    style: &EffectiveStyle,
    segments: &[Segment],
    opts: &ExportOptions,
    sink: &mut dyn DownloadSink,
    cancel: &CancelToken,
) -> Result<ExportReport> {
    let mut report = ExportReport::default();
    let single = segments.len() == 1;
    let background = paint::background_fill(style);
    // Segments cover [0, H); the last boundary is the document height.
    let doc_height = segments.last().map_or(0, |s| s.end_y);

    for (i, segment) in segments.iter().enumerate() {
        if let Err(err) = export_one(
            rasterizer, doc, root, style, segment, single, background, doc_height, opts, sink,
            cancel, i,
        ) {
            let completed = report.files.len();
            if completed > 0 {
                return Err(Error::PartialSegmentFailure {
                    completed,
                    failed: segment.filename.clone(),
                    source: Box::new(err),
                });
            }
            return Err(err);
        }
        report.files.push(segment.filename.clone());
        info!("exported {} ({}/{})", segment.filename, i + 1, segments.len());
    }

    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn export_one(
    rasterizer: &mut Rasterizer,
    doc: &Document,
    root: NodeId,
    style: &EffectiveStyle,
    segment: &Segment,
    single: bool,
    background: paint::Fill,
    doc_height: u32,
    opts: &ExportOptions,
    sink: &mut dyn DownloadSink,
    cancel: &CancelToken,
    index: usize,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if index > 0 && opts.delay_ms > 0 {
        std::thread::sleep(Duration::from_millis(opts.delay_ms));
    }

    let raster_opts = RasterOptions {
        width_px: opts.width_px,
        height_px: segment.height(),
        background,
        supersample: if single {
            opts.supersample
        } else {
            SEGMENT_PIXEL_RATIO
        },
        translate_y: segment.start_y as i32,
        background_height: doc_height,
    };
    let bitmap = rasterizer.rasterize(doc, root, style, &raster_opts)?;
    sink.deliver(&segment.filename, &bitmap.png_data)
}
