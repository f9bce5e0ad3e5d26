use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// All errors that the crate can generate
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error(transparent)]
    /// An I/O error occurred
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse the font
    FaceParsing(#[from] owned_ttf_parser::FaceParsingError),

    #[error(transparent)]
    /// [image] failed to parse the image
    Image(#[from] image::ImageError),

    #[error("malformed OCR document: {0}")]
    /// The OCR result does not have the expected shape
    MalformedDocument(String),

    #[error("invalid text box: {0}")]
    /// The target rectangle of a line is empty or otherwise unusable
    Geometry(String),

    #[error("rotation must be a multiple of 90, got {0}")]
    /// A text rotation that is not a multiple of 90 degrees
    Rotation(i32),

    #[error("no OCR result found next to image: {}", .0.display())]
    /// An input image has no OCR companion file
    MissingSiblingFile(PathBuf),

    #[error("input is neither a file nor a directory: {}", .0.display())]
    /// The input path can not be used
    InvalidInput(PathBuf),

    #[error("no page was produced")]
    /// Every input was skipped, there is nothing to write
    NoPages,

    #[error("page is missing from the document")]
    /// A page id in the page order does not resolve to a page
    PageMissing,

    #[error("index {index} out of range for length {len}")]
    /// Indexed access to a point or rect component outside its range
    Index { index: usize, len: usize },
}

impl From<serde_json::Error> for OverlayError {
    fn from(e: serde_json::Error) -> Self {
        OverlayError::MalformedDocument(e.to_string())
    }
}
