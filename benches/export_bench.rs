use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mdshot::dom::Document;
use mdshot::export::{CancelToken, MemorySink};
use mdshot::render::paint::Fill;
use mdshot::{RasterOptions, Rasterizer, SessionConfig, StyleOverrides};

const DOC: &str = "# Benchmark Document\n\n\
A paragraph of body text that is long enough to wrap across several lines in \
the preview content box, followed by structured content.\n\n\
## Section\n\n\
- item one\n- item two\n- item three\n\n\
```\nfn bench() -> u32 { 42 }\n```\n\n\
> a quoted line\n";

fn bench_rasterize(c: &mut Criterion) {
    let doc = Document::parse_fragment(
        "<h1>Title</h1><p>body text body text body text</p><pre>code</pre>",
        "article",
    );
    let style = StyleOverrides::default().effective(&mdshot::theme::resolve("light"));
    let mut rasterizer = Rasterizer::software(30_000);
    let opts = RasterOptions {
        width_px: 720,
        height_px: 480,
        background: Fill::Solid([255, 255, 255, 255]),
        supersample: 2,
        translate_y: 0,
        background_height: 480,
    };

    c.bench_function("rasterize_720x480_2x", |b| {
        b.iter(|| {
            let bmp = rasterizer
                .rasterize(&doc, doc.root(), &style, black_box(&opts))
                .unwrap();
            black_box(bmp.png_data.len())
        })
    });
}

#[cfg(feature = "markdown")]
fn bench_full_export(c: &mut Criterion) {
    let config = SessionConfig {
        download_delay_ms: 0,
        ..SessionConfig::default()
    };
    let mut session = mdshot::new_session(config);
    session.set_source(DOC);
    let cancel = CancelToken::new();

    c.bench_function("export_uncut_document", |b| {
        b.iter(|| {
            let mut sink = MemorySink::default();
            let report = session.export(&mut sink, &cancel).unwrap();
            black_box(report.files.len())
        })
    });
}

#[cfg(not(feature = "markdown"))]
fn bench_full_export(_c: &mut Criterion) {}

criterion_group!(benches, bench_rasterize, bench_full_export);
criterion_main!(benches);
