#![cfg(feature = "markdown")]

use mdshot::export::{CancelToken, MemorySink};
use mdshot::{HeadingLevel, SessionConfig};

fn session() -> mdshot::Session {
    let config = SessionConfig {
        download_delay_ms: 0,
        ..SessionConfig::default()
    };
    mdshot::new_session(config)
}

const DOC: &str = "# Release Notes\n\n\
Some introductory text that spans the first region of the document.\n\n\
## Changes\n\n\
- first change\n\
- second change\n\n\
```\nfn main() {}\n```\n\n\
> a closing remark\n";

#[test]
fn uncut_export_produces_one_title_named_file() {
    let mut s = session();
    s.set_source(DOC);
    let mut sink = MemorySink::default();
    let report = s.export(&mut sink, &CancelToken::new()).unwrap();
    assert_eq!(report.files, &["release-notes.png"]);
    assert_eq!(sink.files.len(), 1);
}

#[test]
fn untitled_document_uses_fallback_name() {
    let mut s = session();
    s.set_source("plain paragraph, no heading");
    let mut sink = MemorySink::default();
    let report = s.export(&mut sink, &CancelToken::new()).unwrap();
    assert_eq!(report.files, &["markdown-export.png"]);
}

#[test]
fn cut_export_numbers_every_file_from_one() {
    let mut s = session();
    s.set_source(DOC);
    s.toggle_cutting();
    let height = s.render_preview().unwrap().height;
    s.add_cut_line(height / 3).unwrap();
    s.add_cut_line(height * 2 / 3).unwrap();

    let mut sink = MemorySink::default();
    let report = s.export(&mut sink, &CancelToken::new()).unwrap();
    assert_eq!(
        report.files,
        &[
            "release-notes-1.png",
            "release-notes-2.png",
            "release-notes-3.png"
        ]
    );
}

#[test]
fn exported_bitmap_is_supersampled() {
    let mut s = session();
    s.set_source("# Size Check\n\nbody");
    let mut sink = MemorySink::default();
    s.export(&mut sink, &CancelToken::new()).unwrap();

    let (_, png) = &sink.files[0];
    let img = image::load_from_memory(png).unwrap();
    // Width is the 720px preview at the default 2x factor.
    assert_eq!(img.width(), 1440);
    assert_eq!(img.height() % 2, 0);
}

#[test]
fn segment_heights_cover_the_document() {
    let mut s = session();
    s.set_source(DOC);
    s.toggle_cutting();
    let height = s.render_preview().unwrap().height;
    s.add_cut_line(height / 2).unwrap();

    let mut sink = MemorySink::default();
    s.export(&mut sink, &CancelToken::new()).unwrap();

    let total: u32 = sink
        .files
        .iter()
        .map(|(_, png)| image::load_from_memory(png).unwrap().height() / 2)
        .sum();
    assert_eq!(total, height);
}

#[test]
fn style_overrides_are_validated_but_survive_theme_switches() {
    let mut s = session();
    s.set_source("# Styled");
    assert!(s
        .overrides_mut()
        .set_heading_scale(HeadingLevel::H1, 9.0)
        .is_err());
    s.overrides_mut().set_body_size(20.0).unwrap();

    let before = s.render_preview().unwrap().height;
    s.set_theme("ocean");
    let after = s.render_preview().unwrap().height;
    // The size override is not theme-sourced, so the layout is unchanged.
    assert_eq!(before, after);
}

#[test]
fn emoji_in_title_never_reach_the_filename() {
    let mut s = session();
    s.set_source("# Hello World! \u{1F389}\n\nbody");
    let mut sink = MemorySink::default();
    let report = s.export(&mut sink, &CancelToken::new()).unwrap();
    assert_eq!(report.files, &["hello-world.png"]);
}

#[test]
fn back_to_back_exports_are_identical() {
    let mut s = session();
    s.set_source(DOC);
    let cancel = CancelToken::new();

    let mut first = MemorySink::default();
    s.export(&mut first, &cancel).unwrap();
    let mut second = MemorySink::default();
    s.export(&mut second, &cancel).unwrap();

    assert_eq!(first.files, second.files);
}
