//! Markdown-to-document rendering.
//!
//! The session is markup-agnostic behind [`MarkupRenderer`]; the default
//! implementation drives `pulldown-cmark` with GitHub-style extensions and
//! parses the produced HTML into a [`Document`].

use crate::dom::Document;
use crate::error::Result;

/// Container element wrapping the rendered markup.
pub const PREVIEW_CONTAINER_TAG: &str = "article";

/// Rendering knobs for the markup pass.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            tables: true,
            strikethrough: true,
            tasklists: true,
            footnotes: false,
        }
    }
}

/// Source-markup seam: turns editor text into a preview document.
pub trait MarkupRenderer: Send {
    fn render(&self, source: &str) -> Result<Document>;
}

/// CommonMark renderer backed by `pulldown-cmark`.
#[cfg(feature = "markdown")]
#[derive(Debug, Clone, Default)]
pub struct PulldownRenderer {
    opts: RenderOptions,
}

#[cfg(feature = "markdown")]
impl PulldownRenderer {
    pub fn new(opts: RenderOptions) -> Self {
        PulldownRenderer { opts }
    }
}

#[cfg(feature = "markdown")]
impl MarkupRenderer for PulldownRenderer {
    fn render(&self, source: &str) -> Result<Document> {
        use pulldown_cmark::{html, Options, Parser};

        let mut options = Options::empty();
        if self.opts.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.opts.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.opts.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.opts.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }

        let parser = Parser::new_ext(source, options);
        let mut out = String::new();
        html::push_html(&mut out, parser);
        Ok(Document::parse_fragment(&out, PREVIEW_CONTAINER_TAG))
    }
}
