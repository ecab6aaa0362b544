//! Keypoint type shared by detectors and descriptor extractors.

/// A locally distinctive image location.
///
/// `response` is only comparable between keypoints from the same detection
/// pass. Coordinates are in base-image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    /// Column, sub-pixel.
    pub x: f32,
    /// Row, sub-pixel.
    pub y: f32,
    /// Detector response at the keypoint.
    pub response: f32,
    /// Scale relative to the base image (1.0 at full resolution).
    pub scale: f32,
    /// Orientation in radians within [0, 2π), when assigned.
    pub orientation: Option<f32>,
}

impl Keypoint {
    /// Creates an unoriented full-resolution keypoint.
    pub fn new(x: f32, y: f32, response: f32) -> Self {
        Self {
            x,
            y,
            response,
            scale: 1.0,
            orientation: None,
        }
    }

    /// Returns the keypoint with `orientation` set.
    pub fn with_orientation(mut self, orientation: f32) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Returns the keypoint with `scale` set.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Euclidean distance to another keypoint.
    pub fn distance_to(&self, other: &Keypoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}
