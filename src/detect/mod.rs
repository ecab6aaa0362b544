//! Multi-scale sliding-window detection.
//!
//! [`WindowScanner`] slides a fixed window over every level of a scale
//! pyramid and keeps windows whose score clears a threshold; [`nms_boxes`]
//! collapses overlapping detections. [`HogDescriptor`] and
//! [`LinearClassifier`] provide a gradient-histogram window scorer.

mod hog;
mod nms;
mod scan;

pub use hog::{HogConfig, HogDescriptor, LinearClassifier};
pub use nms::{nms_boxes, NmsConfig};
pub use scan::{ScanConfig, ScanLevels, ScanState, WindowScanner, WindowScorer};

use crate::image::{ImageView, Pixel};
use crate::util::FeatScanResult;

/// Axis-aligned detection box in base-image pixels with a confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionWindow {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
    /// Scorer output for the window.
    pub confidence: f32,
    /// Pyramid level the window was found on.
    pub level: usize,
}

impl DetectionWindow {
    /// Returns the box area.
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection area over union area; 0 for disjoint or empty boxes.
    pub fn iou(&self, other: &DetectionWindow) -> f32 {
        let ix0 = self.x.max(other.x);
        let iy0 = self.y.max(other.y);
        let ix1 = (self.x + self.width).min(other.x + other.width);
        let iy1 = (self.y + self.height).min(other.y + other.height);
        let inter = (ix1 - ix0).max(0.0) * (iy1 - iy0).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }
}

/// Scans `image` and suppresses overlapping detections in one call.
pub fn detect_multiscale<T, S>(
    image: ImageView<'_, T>,
    scorer: &S,
    scan: &ScanConfig,
    nms: &NmsConfig,
) -> FeatScanResult<Vec<DetectionWindow>>
where
    T: Pixel,
    S: WindowScorer + Sync + ?Sized,
{
    let scanner = WindowScanner::new(scan.clone())?;
    let raw = scanner.scan(image, scorer)?;
    nms_boxes(&raw, nms)
}
