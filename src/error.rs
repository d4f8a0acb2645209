//! Error type shared by every operation in the crate.

/// Errors raised by segmentation, contour and superpixel operations.
#[derive(Debug, thiserror::Error)]
pub enum SegmentationError {
    #[error("seed ({x}, {y}) lies outside the {width}x{height} image")]
    SeedOutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("invalid mask format: {0}")]
    InvalidMaskFormat(String),

    #[error("mask has {count} disconnected foreground components, expected one")]
    MultipleDisconnectedComponents { count: usize },

    #[error("unsupported channel count {0}, expected 1 or 3")]
    UnsupportedChannels(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("label {0} does not fit in 24 bits")]
    LabelOverflow(u32),

    #[error("label {label} has no value (only {len} values supplied)")]
    LabelOutOfRange { label: u32, len: usize },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SegmentationError>;
