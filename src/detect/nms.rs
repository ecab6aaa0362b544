//! Greedy overlap suppression for detection boxes.

use crate::detect::DetectionWindow;
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatScanError, FeatScanResult};
use std::cmp::Ordering;

/// Detection NMS parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NmsConfig {
    /// IoU at or above which a lower-ranked box is discarded, in (0, 1].
    pub overlap_threshold: f32,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
        }
    }
}

impl NmsConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> FeatScanResult<()> {
        if !(self.overlap_threshold > 0.0 && self.overlap_threshold <= 1.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "overlap_threshold",
                reason: "must be in (0, 1]",
            });
        }
        Ok(())
    }
}

fn window_cmp_desc(a: &DetectionWindow, b: &DetectionWindow) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.x.total_cmp(&b.x))
        .then_with(|| a.width.total_cmp(&b.width))
        .then_with(|| a.height.total_cmp(&b.height))
}

/// Keeps boxes in descending confidence order, discarding any box whose IoU
/// with an already kept box is at least `overlap_threshold`.
///
/// Kept boxes pairwise overlap strictly less than the threshold, so running
/// the function on its own output returns it unchanged.
pub fn nms_boxes(
    detections: &[DetectionWindow],
    cfg: &NmsConfig,
) -> FeatScanResult<Vec<DetectionWindow>> {
    cfg.validate()?;
    let _span = trace_span!("detection_nms", candidates = detections.len()).entered();

    let mut sorted = detections.to_vec();
    sorted.sort_by(window_cmp_desc);

    let mut kept: Vec<DetectionWindow> = Vec::new();
    for det in sorted {
        if kept
            .iter()
            .any(|k| k.iou(&det) >= cfg.overlap_threshold)
        {
            continue;
        }
        kept.push(det);
    }

    trace_event!("detections_kept", count = kept.len());
    Ok(kept)
}
