#![cfg(feature = "markdown")]

use mdshot::session::CutMode;
use mdshot::{SessionConfig, Studio};

fn config() -> SessionConfig {
    SessionConfig {
        download_delay_ms: 0,
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn studio_exports_to_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let studio = Studio::new(config()).await.unwrap();
    studio
        .set_source("# Async Export\n\nDriven through the worker thread.")
        .await
        .unwrap();

    let report = studio.export(dir.path()).await.unwrap();
    assert_eq!(report.files, &["async-export.png"]);

    let path = dir.path().join("async-export.png");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");

    studio.close().await.unwrap();
}

#[tokio::test]
async fn cut_lines_flow_through_the_command_loop() {
    let dir = tempfile::tempdir().unwrap();
    let studio = Studio::new(config()).await.unwrap();
    studio.set_source("# Doc\n\none\n\ntwo\n\nthree").await.unwrap();

    assert_eq!(
        studio.toggle_cutting().await.unwrap(),
        CutMode::CuttingActive
    );
    let (_, height) = studio.preview().await.unwrap();
    studio.add_cut_line(height / 2).await.unwrap();
    assert!(studio.add_cut_line(height / 2).await.is_err());
    assert!(studio.add_cut_line(height + 10).await.is_err());

    let report = studio.export(dir.path()).await.unwrap();
    assert_eq!(report.files, &["doc-1.png", "doc-2.png"]);
    assert!(dir.path().join("doc-2.png").exists());

    studio.close().await.unwrap();
}

#[tokio::test]
async fn theme_switches_change_exported_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let studio = Studio::new(config()).await.unwrap();
    studio.set_source("# Palette\n\nbody").await.unwrap();

    studio.export(dir.path().join("light")).await.unwrap();
    studio.set_theme("dark").await.unwrap();
    studio.export(dir.path().join("dark")).await.unwrap();

    let light = std::fs::read(dir.path().join("light/palette.png")).unwrap();
    let dark = std::fs::read(dir.path().join("dark/palette.png")).unwrap();
    assert_ne!(light, dark);

    studio.close().await.unwrap();
}

#[tokio::test]
async fn preview_reports_chrome_only_while_cutting() {
    let studio = Studio::new(config()).await.unwrap();
    studio.set_source("# Doc\n\nbody").await.unwrap();

    let (html, _) = studio.preview().await.unwrap();
    assert!(!html.contains("data-chrome"));

    studio.toggle_cutting().await.unwrap();
    let (html, _) = studio.preview().await.unwrap();
    assert!(html.contains("data-chrome=\"banner\""));

    studio.toggle_cutting().await.unwrap();
    let (html, _) = studio.preview().await.unwrap();
    assert!(!html.contains("data-chrome"));

    studio.close().await.unwrap();
}
