//! Error types for featscan.

use thiserror::Error;

/// Result alias for featscan operations.
pub type FeatScanResult<T> = std::result::Result<T, FeatScanError>;

/// Errors that can occur when running featscan algorithms.
///
/// Empty outcomes (no keypoints, no matches, no detections) are never errors;
/// they are reported as empty vectors.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FeatScanError {
    /// The input data is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer holds fewer elements than the dimensions require.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The buffer length does not match the declared channel layout.
    #[error("buffer of length {len} does not match {channels} channel(s)")]
    ChannelMismatch { channels: usize, len: usize },
    /// A configuration value is out of its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    /// A region of interest does not fit in the image.
    #[error("roi ({x}, {y}, {width}x{height}) exceeds image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A descriptor sampling patch reads outside the image.
    #[error("patch of radius {radius} at ({x}, {y}) exceeds image {img_width}x{img_height}")]
    PatchOutOfBounds {
        x: f32,
        y: f32,
        radius: f32,
        img_width: usize,
        img_height: usize,
    },
    /// Descriptor sets differ in length or metric.
    #[error("incompatible descriptors: {reason}")]
    IncompatibleDescriptors { reason: &'static str },
}

impl FeatScanError {
    /// Returns true for malformed buffers and inconsistent dimensions.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            FeatScanError::InvalidInput(_)
                | FeatScanError::InvalidDimensions { .. }
                | FeatScanError::InvalidStride { .. }
                | FeatScanError::BufferTooSmall { .. }
                | FeatScanError::ChannelMismatch { .. }
        )
    }
}
