//! The rasterization adapter and its backend seam.
//!
//! [`Rasterizer`] is the single rasterization primitive used by both
//! full-document and segment export. It validates the target, forwards the
//! request to a [`RasterBackend`] running on a dedicated worker thread, and
//! enforces a watchdog timeout so a hung backend cannot hang an export.

pub mod layout;
pub mod paint;
pub mod raster;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::style::EffectiveStyle;

/// One produced bitmap: PNG bytes plus pixel dimensions.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// Options for one rasterization call.
///
/// `width_px`/`height_px` are the unscaled content-box dimensions; the
/// produced bitmap is `width_px * supersample` by `height_px * supersample`.
/// `translate_y` shifts the content up before rasterizing, which is how the
/// segment engine selects a vertical slice. `background_height` is the full
/// document height a gradient background spans; slices of one document share
/// it so the gradient continues across cuts.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub width_px: u32,
    pub height_px: u32,
    pub background: paint::Fill,
    pub supersample: u32,
    pub translate_y: i32,
    pub background_height: u32,
}

/// Backend seam: turns a document subtree into a bitmap.
pub trait RasterBackend: Send {
    fn rasterize(
        &mut self,
        doc: &Document,
        root: NodeId,
        style: &EffectiveStyle,
        opts: &RasterOptions,
    ) -> Result<Bitmap>;
}

/// The built-in layout/paint/fill backend.
pub struct SoftwareBackend;

impl RasterBackend for SoftwareBackend {
    fn rasterize(
        &mut self,
        doc: &Document,
        root: NodeId,
        style: &EffectiveStyle,
        opts: &RasterOptions,
    ) -> Result<Bitmap> {
        let doc_layout = layout::layout_document(doc, root, style, opts.width_px);
        let commands = paint::build_commands(&doc_layout, style);
        let pm = raster::rasterize(
            &commands,
            opts.width_px,
            opts.height_px,
            opts.background,
            opts.supersample,
            opts.translate_y,
            opts.background_height,
        );
        let png_data = raster::encode_png(&pm)?;
        Ok(Bitmap {
            width: pm.width,
            height: pm.height,
            png_data,
        })
    }
}

type BackendFactory = Arc<dyn Fn() -> Box<dyn RasterBackend> + Send + Sync>;

struct RasterJob {
    doc: Document,
    root: NodeId,
    style: EffectiveStyle,
    opts: RasterOptions,
    resp: mpsc::Sender<Result<Bitmap>>,
}

/// The rasterization adapter.
///
/// The backend runs on a worker thread; each request is answered through a
/// channel with `recv_timeout` as the watchdog. On timeout the worker is
/// abandoned and replaced on the next call, so one stuck request does not
/// poison the session.
pub struct Rasterizer {
    factory: BackendFactory,
    timeout_ms: u64,
    worker_tx: Option<mpsc::Sender<RasterJob>>,
}

impl Rasterizer {
    pub fn new(factory: impl Fn() -> Box<dyn RasterBackend> + Send + Sync + 'static, timeout_ms: u64) -> Self {
        Rasterizer {
            factory: Arc::new(factory),
            timeout_ms,
            worker_tx: None,
        }
    }

    /// Adapter over the built-in software backend.
    pub fn software(timeout_ms: u64) -> Self {
        Self::new(|| Box::new(SoftwareBackend), timeout_ms)
    }

    /// Rasterize `root` within `doc` according to `opts`.
    ///
    /// Fails with [`Error::NodeDetached`] or [`Error::ZeroSize`] before the
    /// backend is consulted.
    pub fn rasterize(
        &mut self,
        doc: &Document,
        root: NodeId,
        style: &EffectiveStyle,
        opts: &RasterOptions,
    ) -> Result<Bitmap> {
        if !doc.is_attached(root) {
            return Err(Error::NodeDetached);
        }
        if opts.width_px == 0 || opts.height_px == 0 {
            return Err(Error::ZeroSize);
        }
        if opts.supersample == 0 {
            return Err(Error::Config("supersample factor must be at least 1".into()));
        }

        let tx = self.worker()?;
        let (resp_tx, resp_rx) = mpsc::channel();
        let job = RasterJob {
            doc: doc.clone(),
            root,
            style: style.clone(),
            opts: opts.clone(),
            resp: resp_tx,
        };
        if tx.send(job).is_err() {
            // Worker died; retry once on a fresh one.
            self.worker_tx = None;
            return Err(Error::Raster("raster worker terminated".into()));
        }

        match resp_rx.recv_timeout(Duration::from_millis(self.timeout_ms)) {
            Ok(res) => res,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!("rasterization timed out after {}ms; replacing worker", self.timeout_ms);
                // Abandon the stuck worker; the next call spawns a fresh one.
                self.worker_tx = None;
                Err(Error::Timeout(self.timeout_ms))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.worker_tx = None;
                Err(Error::Raster("raster worker dropped the request".into()))
            }
        }
    }

    fn worker(&mut self) -> Result<mpsc::Sender<RasterJob>> {
        if let Some(tx) = &self.worker_tx {
            return Ok(tx.clone());
        }
        let (tx, rx) = mpsc::channel::<RasterJob>();
        let factory = self.factory.clone();
        std::thread::Builder::new()
            .name("raster-worker".into())
            .spawn(move || {
                let mut backend = factory();
                while let Ok(job) = rx.recv() {
                    let res = backend.rasterize(&job.doc, job.root, &job.style, &job.opts);
                    let _ = job.resp.send(res);
                }
            })
            .map_err(|e| Error::Raster(format!("failed to spawn raster worker: {}", e)))?;
        self.worker_tx = Some(tx.clone());
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::style::StyleOverrides;
    use crate::theme;

    fn style() -> EffectiveStyle {
        StyleOverrides::default().effective(&theme::resolve("light"))
    }

    fn opts(w: u32, h: u32, ss: u32) -> RasterOptions {
        RasterOptions {
            width_px: w,
            height_px: h,
            background: paint::Fill::Solid([255, 255, 255, 255]),
            supersample: ss,
            translate_y: 0,
            background_height: h,
        }
    }

    #[test]
    fn supersample_doubles_output_dimensions() {
        let doc = Document::parse_fragment("<p>hello</p>", "article");
        let mut r = Rasterizer::software(5_000);
        let bmp = r
            .rasterize(&doc, doc.root(), &style(), &opts(400, 300, 2))
            .unwrap();
        assert_eq!((bmp.width, bmp.height), (800, 600));
        assert_eq!(&bmp.png_data[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn detached_node_is_rejected() {
        let mut doc = Document::parse_fragment("<p>hello</p>", "article");
        let p = doc.children(doc.root())[0];
        doc.detach(p);
        let mut r = Rasterizer::software(5_000);
        assert!(matches!(
            r.rasterize(&doc, p, &style(), &opts(100, 100, 1)),
            Err(Error::NodeDetached)
        ));
    }

    #[test]
    fn zero_size_is_rejected() {
        let doc = Document::parse_fragment("<p>hello</p>", "article");
        let mut r = Rasterizer::software(5_000);
        assert!(matches!(
            r.rasterize(&doc, doc.root(), &style(), &opts(0, 100, 1)),
            Err(Error::ZeroSize)
        ));
    }

    #[test]
    fn hung_backend_trips_watchdog() {
        struct HangingBackend;
        impl RasterBackend for HangingBackend {
            fn rasterize(
                &mut self,
                _doc: &Document,
                _root: NodeId,
                _style: &EffectiveStyle,
                _opts: &RasterOptions,
            ) -> Result<Bitmap> {
                std::thread::sleep(Duration::from_secs(60));
                Err(Error::Raster("unreachable".into()))
            }
        }

        let doc = Document::parse_fragment("<p>hello</p>", "article");
        let mut r = Rasterizer::new(|| Box::new(HangingBackend), 50);
        assert!(matches!(
            r.rasterize(&doc, doc.root(), &style(), &opts(10, 10, 1)),
            Err(Error::Timeout(50))
        ));
    }

    #[test]
    fn output_is_deterministic() {
        use sha2::{Digest, Sha256};
        let doc = Document::parse_fragment("<h1>Title</h1><p>body</p>", "article");
        let mut r = Rasterizer::software(5_000);
        let a = r
            .rasterize(&doc, doc.root(), &style(), &opts(300, 200, 1))
            .unwrap();
        let b = r
            .rasterize(&doc, doc.root(), &style(), &opts(300, 200, 1))
            .unwrap();
        assert_eq!(
            hex::encode(Sha256::digest(&a.png_data)),
            hex::encode(Sha256::digest(&b.png_data))
        );
    }
}
