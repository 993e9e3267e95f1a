//! mdshot
//!
//! A headless markdown-to-image export engine: render markdown into a styled
//! preview document, cut it into vertical segments, and rasterize each segment
//! to a PNG with stable, title-derived file names.
//!
//! # Features
//!
//! - **Markdown backend** (default): CommonMark rendering via `pulldown-cmark`
//! - **Themes and overrides**: eight built-in palettes plus per-field style
//!   overrides, merged at render time
//! - **Segment export**: user-placed cut lines split the document into
//!   separately delivered PNG files
//!
//! # Example
//!
//! ```no_run
//! use mdshot::SessionConfig;
//! use mdshot::export::{CancelToken, MemorySink};
//!
//! # #[cfg(feature = "markdown")]
//! # fn main() -> mdshot::Result<()> {
//! let mut session = mdshot::new_session(SessionConfig::default());
//! session.set_source("# Hello World\n\nSome body text.");
//! session.set_theme("dark");
//!
//! let mut sink = MemorySink::default();
//! let report = session.export(&mut sink, &CancelToken::new())?;
//! assert_eq!(report.files, &["hello-world.png"]);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "markdown"))]
//! # fn main() {}
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod dom;
pub mod emoji;
pub mod export;
pub mod markdown;
pub mod render;
pub mod session;
pub mod style;
pub mod theme;
pub mod title;

// Async-friendly editor API (worker-backed abstraction)
pub mod async_api;

pub use async_api::Studio;
pub use render::{Bitmap, RasterBackend, RasterOptions, Rasterizer, SoftwareBackend};
pub use session::{CutMode, PreviewFrame, Session, SessionConfig};
pub use style::{EffectiveStyle, HeadingLevel, StyleOverrides};
pub use theme::ThemeTokens;

/// Create a session with the default markdown renderer.
#[cfg(feature = "markdown")]
pub fn new_session(config: SessionConfig) -> Session {
    Session::new(config, Box::new(markdown::PulldownRenderer::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_preview_surface() {
        let config = SessionConfig::default();
        assert_eq!(config.preview_width, 720);
        assert_eq!(config.supersample, 2);
        assert_eq!(config.download_delay_ms, 500);
        assert_eq!(config.theme, "light");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.preview_width, config.preview_width);
        assert_eq!(back.raster_timeout_ms, config.raster_timeout_ms);
    }
}
