//! Corner response detection and keypoint selection.
//!
//! [`CornerDetector`] computes a structure-tensor response map and selects
//! spatially separated maxima from it. [`PyramidDetector`] runs any
//! [`KeypointDetector`] across a scale pyramid.

mod orientation;
mod response;
mod select;

pub use orientation::{assign_orientations, estimate_orientation};
pub use response::corner_response;
pub use select::select_keypoints;

use crate::image::pyramid::ImagePyramid;
use crate::image::{ImageView, OwnedImage};
use crate::keypoint::Keypoint;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{FeatScanError, FeatScanResult};
use std::cmp::Ordering;

/// Structure-tensor response measure.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResponseKind {
    /// Smaller eigenvalue of the tensor (Shi-Tomasi).
    MinEigen,
    /// `det(M) - k * trace(M)^2`.
    Harris { k: f32 },
}

/// Orientation estimator applied after selection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OrientationMethod {
    /// Angle of the intensity centroid over a disc.
    IntensityCentroid { radius: usize },
    /// Dominant bin of a gradient orientation histogram over a disc.
    GradientHistogram { radius: usize, bins: usize },
}

/// Keypoint selection parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SelectorConfig {
    /// Fraction of the strongest response a candidate must reach, in (0, 1].
    pub quality_level: f32,
    /// Minimum Euclidean distance between accepted keypoints.
    pub min_distance: f32,
    /// Maximum keypoints returned; 0 means no limit.
    pub max_keypoints: usize,
    /// Only 3x3 local maxima are candidates.
    pub local_maxima_only: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            quality_level: 0.01,
            min_distance: 10.0,
            max_keypoints: 128,
            local_maxima_only: true,
        }
    }
}

impl SelectorConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> FeatScanResult<()> {
        if !(self.quality_level > 0.0 && self.quality_level <= 1.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "quality_level",
                reason: "must be in (0, 1]",
            });
        }
        if !(self.min_distance.is_finite() && self.min_distance >= 0.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "min_distance",
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// Corner detector configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CornerConfig {
    /// Response measure.
    pub response: ResponseKind,
    /// Odd side of the tensor accumulation window.
    pub block_size: usize,
    /// Selection over the response map.
    pub selector: SelectorConfig,
    /// Orientation assigned to selected keypoints, if any.
    pub orientation: Option<OrientationMethod>,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            response: ResponseKind::MinEigen,
            block_size: 3,
            selector: SelectorConfig::default(),
            orientation: None,
        }
    }
}

/// Detection capability shared by single-scale and multi-scale detectors.
pub trait KeypointDetector {
    /// Detects keypoints ordered by descending response.
    fn detect(&self, image: ImageView<'_, f32>) -> FeatScanResult<Vec<Keypoint>>;
}

/// Structure-tensor corner detector.
#[derive(Clone, Debug, Default)]
pub struct CornerDetector {
    cfg: CornerConfig,
}

impl CornerDetector {
    /// Creates a detector after validating the configuration.
    pub fn new(cfg: CornerConfig) -> FeatScanResult<Self> {
        cfg.selector.validate()?;
        if cfg.block_size == 0 || cfg.block_size % 2 == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "block_size",
                reason: "must be odd and at least 1",
            });
        }
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CornerConfig {
        &self.cfg
    }

    /// Computes the response map for `image`.
    pub fn response_map(&self, image: ImageView<'_, f32>) -> FeatScanResult<OwnedImage<f32>> {
        corner_response(image, self.cfg.response, self.cfg.block_size)
    }
}

impl KeypointDetector for CornerDetector {
    fn detect(&self, image: ImageView<'_, f32>) -> FeatScanResult<Vec<Keypoint>> {
        let response = self.response_map(image)?;
        let mut keypoints = select_keypoints(response.view(), &self.cfg.selector)?;
        if let Some(method) = self.cfg.orientation {
            assign_orientations(image, &mut keypoints, method);
        }
        Ok(keypoints)
    }
}

/// Multi-scale detection parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PyramidConfig {
    /// Ratio between consecutive levels, greater than 1.
    pub scale_factor: f64,
    /// Maximum number of levels including the base.
    pub levels: usize,
    /// Levels smaller than this on either side are skipped.
    pub min_level_size: usize,
    /// Minimum distance between merged keypoints in base pixels.
    pub min_distance: f32,
    /// Maximum merged keypoints; 0 means no limit.
    pub max_keypoints: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.2,
            levels: 8,
            min_level_size: 16,
            min_distance: 0.0,
            max_keypoints: 500,
        }
    }
}

/// Runs an inner detector on every pyramid level and merges the results in
/// base-image coordinates.
#[derive(Clone, Debug)]
pub struct PyramidDetector<D> {
    inner: D,
    cfg: PyramidConfig,
}

impl<D: KeypointDetector> PyramidDetector<D> {
    /// Wraps `inner` for multi-scale detection.
    pub fn new(inner: D, cfg: PyramidConfig) -> FeatScanResult<Self> {
        if !(cfg.scale_factor.is_finite() && cfg.scale_factor > 1.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "scale_factor",
                reason: "must be a finite value greater than 1",
            });
        }
        if cfg.levels == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "levels",
                reason: "must be at least 1",
            });
        }
        Ok(Self { inner, cfg })
    }
}

impl<D: KeypointDetector> KeypointDetector for PyramidDetector<D> {
    fn detect(&self, image: ImageView<'_, f32>) -> FeatScanResult<Vec<Keypoint>> {
        let _span = trace_span!("pyramid_detect", levels = self.cfg.levels).entered();
        let min = self.cfg.min_level_size.max(1);
        let pyramid = ImagePyramid::build(image, self.cfg.scale_factor, (min, min), self.cfg.levels)?;

        let mut merged = Vec::new();
        for (idx, level) in pyramid.levels().iter().enumerate() {
            let scale = level.scale() as f32;
            let (rx, ry) = level.ratio();
            let (rx, ry) = (rx as f32, ry as f32);
            let found = self.inner.detect(level.image().view())?;
            trace_debug!("pyramid_level", level = idx, keypoints = found.len());
            merged.extend(found.into_iter().map(|kp| Keypoint {
                x: (kp.x + 0.5) * rx - 0.5,
                y: (kp.y + 0.5) * ry - 0.5,
                scale: kp.scale * scale,
                ..kp
            }));
        }

        let kept = suppress_keypoints(merged, self.cfg.min_distance, self.cfg.max_keypoints);
        trace_event!("pyramid_keypoints", count = kept.len());
        Ok(kept)
    }
}

fn keypoint_cmp_desc(a: &Keypoint, b: &Keypoint) -> Ordering {
    b.response
        .total_cmp(&a.response)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.x.total_cmp(&b.x))
}

/// Greedy minimum-distance filtering over sub-pixel keypoints.
pub(crate) fn suppress_keypoints(
    mut keypoints: Vec<Keypoint>,
    min_distance: f32,
    limit: usize,
) -> Vec<Keypoint> {
    keypoints.sort_by(keypoint_cmp_desc);
    let limit = if limit == 0 { usize::MAX } else { limit };
    let mut kept: Vec<Keypoint> = Vec::new();
    for kp in keypoints {
        if kept.len() >= limit {
            break;
        }
        if min_distance > 0.0 && kept.iter().any(|k| k.distance_to(&kp) < min_distance) {
            continue;
        }
        kept.push(kp);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::suppress_keypoints;
    use crate::keypoint::Keypoint;

    #[test]
    fn merged_keypoints_respect_distance_and_limit() {
        let keypoints = vec![
            Keypoint::new(10.0, 10.0, 1.0),
            Keypoint::new(12.0, 10.0, 3.0),
            Keypoint::new(30.0, 30.0, 2.0),
            Keypoint::new(50.0, 50.0, 0.5),
        ];
        let kept = suppress_keypoints(keypoints.clone(), 5.0, 0);
        let responses: Vec<f32> = kept.iter().map(|kp| kp.response).collect();
        assert_eq!(responses, vec![3.0, 2.0, 0.5]);

        let kept = suppress_keypoints(keypoints, 0.0, 2);
        let responses: Vec<f32> = kept.iter().map(|kp| kp.response).collect();
        assert_eq!(responses, vec![3.0, 2.0]);
    }
}
