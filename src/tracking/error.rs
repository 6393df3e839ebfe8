//! Tracking Error Types
//!
//! Error handling for the estimator pipeline. Everything here is a
//! programming or configuration error: sensor dropouts are ordinary mode
//! transitions and never surface as errors.

use thiserror::Error;

/// Result type for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Tracking pipeline error types
#[derive(Error, Debug)]
pub enum TrackingError {
    /// Intensity field with a zero dimension
    #[error("Empty intensity field: {width}x{height}")]
    EmptyField {
        /// Field width in pixels
        width: u32,
        /// Field height in pixels
        height: u32,
    },

    /// Intensity field buffer does not match its declared dimensions
    #[error("Field buffer length {actual} does not match {width}x{height} ({expected} samples)")]
    FieldSizeMismatch {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
        /// Expected sample count (width * height)
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// Camera mapping range collapsed to a point
    #[error("Degenerate camera range on {axis} axis")]
    DegenerateRange {
        /// Axis name ("x" or "y")
        axis: &'static str,
    },
}
