// ABOUTME: Error types for the clickcast editor
// ABOUTME: Provides structured error handling for the model, capture and build stages

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastError {
    #[error("I/O error on {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Cannot parse {path:?}: {source}\nIf you edited the file manually, you may try to \
         validate it with a JSON linter for better syntax errors."
    )]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid file {path:?}: {message}")]
    ValidationError { path: PathBuf, message: String },

    #[error("Unsupported format version {found} (this editor reads up to version {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Index {index} is out of range ({len} slides)")]
    RangeError { index: usize, len: usize },

    #[error("Action {action} does not exist on slide {slide}")]
    UnknownAction { slide: usize, action: usize },

    #[error("A slide with id {0} already exists")]
    DuplicateSlideId(String),

    #[error("Invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: f64 },

    #[error("Image path {0:?} must be a relative path inside the project")]
    UnsafeImagePath(String),

    #[error("{0}")]
    StateError(String),

    #[error("Image processing error on {path:?}: {source}")]
    ImageError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Driver error: {0}")]
    DriverError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("Preview server error: {0}")]
    ServerError(String),
}

impl CastError {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CastError::IoError {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CastError>;
