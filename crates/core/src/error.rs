//! Error types for vegtrace

use thiserror::Error;

/// Main error type for vegtrace operations.
///
/// Every variant is fatal for the run that produced it. Per-polygon geometry
/// problems are not errors; the extractor counts and skips them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid label: {label} ({reason})")]
    InvalidLabel { label: i64, reason: &'static str },

    #[error("Label grid has zero area")]
    EmptyLabelGrid,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a shape mismatch between two `(rows, cols)` pairs
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Error::ShapeMismatch { expected, actual }
    }

    /// Shorthand for an invalid parameter
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

/// Result type alias for vegtrace operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = Error::shape_mismatch((2, 2), (3, 2));
        assert_eq!(err.to_string(), "Shape mismatch: expected (2, 2), got (3, 2)");
    }

    #[test]
    fn test_invalid_label_display() {
        let err = Error::InvalidLabel {
            label: 7,
            reason: "not a land-cover class",
        };
        assert!(err.to_string().contains('7'));
    }
}
