//! Keypoint selection over a response map.

use crate::candidate::nms::suppress_min_distance;
use crate::candidate::topk::{Peak, TopK};
use crate::corner::SelectorConfig;
use crate::image::ImageView;
use crate::keypoint::Keypoint;
use crate::trace::{trace_event, trace_span};
use crate::util::FeatScanResult;

/// Selects up to `max_keypoints` keypoints from a response map.
///
/// A pixel is a candidate when its response is positive and at least
/// `quality_level` times the global maximum (and, with
/// `local_maxima_only`, no smaller than any of its 8 neighbours).
/// Candidates are taken in descending response order, ties in raster order,
/// and any candidate closer than `min_distance` to an accepted keypoint is
/// rejected. No candidate yields an empty vector.
pub fn select_keypoints(
    response: ImageView<'_, f32>,
    cfg: &SelectorConfig,
) -> FeatScanResult<Vec<Keypoint>> {
    cfg.validate()?;
    let _span = trace_span!(
        "select_keypoints",
        quality_level = cfg.quality_level,
        min_distance = cfg.min_distance
    )
    .entered();

    let width = response.width();
    let height = response.height();
    let mut max_response = f32::NEG_INFINITY;
    for y in 0..height {
        let row = response.row(y).expect("row within bounds");
        for &v in row {
            if v.is_finite() && v > max_response {
                max_response = v;
            }
        }
    }
    if max_response <= 0.0 {
        trace_event!("keypoints_selected", count = 0usize);
        return Ok(Vec::new());
    }
    let threshold = cfg.quality_level * max_response;

    let mut candidates = Vec::new();
    for y in 0..height {
        let row = response.row(y).expect("row within bounds");
        for (x, &v) in row.iter().enumerate() {
            if !v.is_finite() || v <= 0.0 || v < threshold {
                continue;
            }
            if cfg.local_maxima_only && !is_local_max(response, x, y, v) {
                continue;
            }
            candidates.push(Peak { x, y, score: v });
        }
    }

    let kept = if cfg.min_distance <= 0.0 && cfg.max_keypoints > 0 {
        let mut topk = TopK::new(cfg.max_keypoints);
        for peak in candidates {
            topk.push(peak);
        }
        topk.into_sorted_desc()
    } else {
        suppress_min_distance(&mut candidates, cfg.min_distance, cfg.max_keypoints)
    };

    trace_event!("keypoints_selected", count = kept.len());
    Ok(kept
        .into_iter()
        .map(|p| Keypoint::new(p.x as f32, p.y as f32, p.score))
        .collect())
}

fn is_local_max(response: ImageView<'_, f32>, x: usize, y: usize, v: f32) -> bool {
    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x1 = (x + 1).min(response.width() - 1);
    let y1 = (y + 1).min(response.height() - 1);
    for ny in y0..=y1 {
        let row = response.row(ny).expect("row within bounds");
        for &n in &row[x0..=x1] {
            if n > v {
                return false;
            }
        }
    }
    true
}
