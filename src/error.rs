//! Error types for swwview.
//!
//! This module provides a unified error handling approach using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for swwview operations.
pub type Result<T> = std::result::Result<T, SwwError>;

/// Errors that can occur while reading and deriving geometry from an SWW file.
#[derive(Debug, Error)]
pub enum SwwError {
    /// Failed to open the container.
    #[error("Failed to open file: {path}: {message}")]
    FileOpen { path: PathBuf, message: String },

    /// Any other failure reported by the NetCDF library.
    #[error("NetCDF error: {0}")]
    NetCDF(String),

    /// A required dimension is missing.
    #[error("Dimension not found: {name}")]
    MissingDimension { name: String },

    /// A required variable is missing.
    #[error("Variable not found: {name}")]
    MissingVariable { name: String },

    /// A variable has a rank the reader does not understand.
    #[error("Variable '{name}' has unsupported rank {rank}")]
    UnsupportedRank { name: String, rank: usize },

    /// Triangles must have exactly three vertices.
    #[error("Expected 3 vertices per volume, found {found}")]
    VertexCount { found: usize },

    /// A triangle references a point that does not exist.
    #[error("Triangle {triangle} references point {index} but only {npoints} points exist")]
    IndexOutOfBounds {
        triangle: usize,
        index: u32,
        npoints: usize,
    },

    /// The point dimension shrank since the mesh was loaded.
    #[error("Point count shrank from {expected} to {found}; file changes have made it invalid")]
    PointCountShrunk { expected: usize, found: usize },

    /// Momentum was requested but the file has none.
    #[error("Momentum data is not available in this file")]
    MomentumUnavailable,

    /// Requested timestep does not exist.
    #[error("Timestep {index} out of range (file has {count})")]
    TimestepOutOfRange { index: usize, count: usize },

    /// Requested triangle does not exist.
    #[error("Triangle {index} out of range (mesh has {count})")]
    TriangleOutOfRange { index: usize, count: usize },

    /// An operation needed a loaded mesh or frame.
    #[error("No valid data loaded: {0}")]
    NotLoaded(&'static str),

    /// Texture image could not be decoded.
    #[error("Texture error: {0}")]
    Texture(String),

    /// Georeference metadata could not be parsed.
    #[error("Georeference error: {path}: {message}")]
    Georeference { path: PathBuf, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SwwError {
    /// Create a FileOpen error.
    pub fn file_open(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a MissingDimension error.
    pub fn missing_dimension(name: impl Into<String>) -> Self {
        Self::MissingDimension { name: name.into() }
    }

    /// Create a MissingVariable error.
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    /// Create a Georeference error.
    pub fn georeference(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Georeference {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<netcdf::Error> for SwwError {
    fn from(err: netcdf::Error) -> Self {
        Self::NetCDF(err.to_string())
    }
}

impl From<image::ImageError> for SwwError {
    fn from(err: image::ImageError) -> Self {
        Self::Texture(err.to_string())
    }
}
