//! Error type shared by the cropping pipeline.

use std::path::PathBuf;

/// Errors that can occur while loading, processing or writing island crops
#[derive(Debug)]
pub enum CropError {
    Io(std::io::Error),
    Image(image::ImageError),
    Json(serde_json::Error),
    /// The source image could not be opened or decoded
    Source { path: PathBuf, cause: image::ImageError },
    /// Invalid configuration or region table
    Config(String),
    /// The source image does not match the region table's canonical resolution
    SizeMismatch { expected: (u32, u32), actual: (u32, u32) },
    UnknownRegion(String),
}

impl std::fmt::Display for CropError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropError::Io(e) => write!(f, "IO error: {}", e),
            CropError::Image(e) => write!(f, "Image error: {}", e),
            CropError::Json(e) => write!(f, "JSON error: {}", e),
            CropError::Source { path, cause } => {
                write!(f, "Failed to read source image {}: {}", path.display(), cause)
            }
            CropError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            CropError::SizeMismatch { expected, actual } => write!(
                f,
                "Source image is {}x{} but the region table expects {}x{} (use --rescale or --any-size)",
                actual.0, actual.1, expected.0, expected.1
            ),
            CropError::UnknownRegion(name) => write!(f, "Unknown region: {}", name),
        }
    }
}

impl std::error::Error for CropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CropError::Io(e) => Some(e),
            CropError::Image(e) => Some(e),
            CropError::Json(e) => Some(e),
            CropError::Source { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CropError {
    fn from(e: std::io::Error) -> Self {
        CropError::Io(e)
    }
}

impl From<image::ImageError> for CropError {
    fn from(e: image::ImageError) -> Self {
        CropError::Image(e)
    }
}

impl From<serde_json::Error> for CropError {
    fn from(e: serde_json::Error) -> Self {
        CropError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, CropError>;
