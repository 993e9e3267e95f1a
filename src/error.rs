//! Error types for the export engine

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the export pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// The rasterization target is no longer part of its document
    #[error("Rasterization target is detached from the document")]
    NodeDetached,

    /// The rasterization target has no measurable area
    #[error("Rasterization target has zero measured size")]
    ZeroSize,

    /// The raster backend rejected the request
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Markup rendering failed
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// A numeric style override was outside its declared range
    #[error("Invalid value {value} for {field}: must be between {min} and {max}")]
    InvalidOverrideValue {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A cut line could not be inserted (duplicate or outside the content box)
    #[error("Invalid cut line at y={y}: {reason}")]
    InvalidCutLine { y: u32, reason: &'static str },

    /// A segment failed after earlier segments were already delivered.
    /// Files delivered before the failure are not rolled back.
    #[error("Segment '{failed}' failed after {completed} segment(s) were delivered: {source}")]
    PartialSegmentFailure {
        completed: usize,
        failed: String,
        #[source]
        source: Box<Error>,
    },

    /// An export is already running for this session
    #[error("An export is already in progress")]
    Busy,

    /// The export was cancelled between segments
    #[error("Export cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Delivering an output file failed
    #[error("Download failed: {0}")]
    Download(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
