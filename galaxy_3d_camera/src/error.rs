//! Error types for the Galaxy3D camera crate
//!
//! This module defines the error types used throughout the crate,
//! including camera configuration, depth readback, and reference data.

use std::fmt;

/// Result type for Galaxy3D camera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D camera errors
///
/// Every camera setter is all-or-nothing: when one of these is returned,
/// the state of the object the call was made on is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Extrinsics matrix is non-finite or not a rigid transform
    InvalidCameraMatrix(String),

    /// Look-at direction is zero-length or parallel to the up vector
    DegenerateLookAt(String),

    /// Non-positive or non-finite focal length
    InvalidIntrinsics(String),

    /// Zero width or height
    InvalidResolution(String),

    /// Near/far planes not satisfying 0 < near < far
    InvalidClipPlanes(String),

    /// Linear depth requested from a multisampled depth buffer
    UnsupportedSampleCount(u32),

    /// Depth requested before any frame was rendered
    NoFrameRendered,

    /// Configuration file could not be parsed or holds invalid values
    InvalidConfig(String),

    /// Reference cameras or reference depth maps are malformed
    InvalidReference(String),

    /// Mesh data is malformed (index out of range, non-finite vertex, etc.)
    InvalidMesh(String),

    /// File system error (message of the underlying io::Error)
    Io(String),

    /// Image encoding or decoding failed (depth maps, silhouettes)
    Image(String),

    /// Initialization failed (engine, logging)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCameraMatrix(msg) => write!(f, "Invalid camera matrix: {}", msg),
            Error::DegenerateLookAt(msg) => write!(f, "Degenerate look-at: {}", msg),
            Error::InvalidIntrinsics(msg) => write!(f, "Invalid intrinsics: {}", msg),
            Error::InvalidResolution(msg) => write!(f, "Invalid resolution: {}", msg),
            Error::InvalidClipPlanes(msg) => write!(f, "Invalid clip planes: {}", msg),
            Error::UnsupportedSampleCount(samples) => write!(
                f,
                "Unsupported sample count: linear depth needs 1 sample per pixel, got {}",
                samples
            ),
            Error::NoFrameRendered => write!(f, "No frame rendered yet"),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            Error::InvalidReference(msg) => write!(f, "Invalid reference: {}", msg),
            Error::InvalidMesh(msg) => write!(f, "Invalid mesh: {}", msg),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::Image(msg) => write!(f, "Image error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
