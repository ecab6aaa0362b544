//! Keypoint orientation assignment.
//!
//! Two estimators are provided. The intensity centroid takes the angle of the
//! first-order image moments over a disc around the keypoint. The gradient
//! histogram takes the dominant bin of a magnitude-weighted orientation
//! histogram over the same disc, refined with a parabolic fit. Both radii
//! are scaled by `Keypoint::scale`.

use crate::corner::OrientationMethod;
use crate::image::ImageView;
use crate::keypoint::Keypoint;
use crate::util::math::{parabolic_peak_offset, wrap_rad};
use std::f32::consts::TAU;

/// Fills `orientation` on each keypoint.
///
/// Keypoints whose disc leaves the image, or whose patch has no structure,
/// keep `orientation == None`.
pub fn assign_orientations(
    image: ImageView<'_, f32>,
    keypoints: &mut [Keypoint],
    method: OrientationMethod,
) {
    for kp in keypoints.iter_mut() {
        kp.orientation = estimate_orientation(image, kp, method);
    }
}

/// Estimates the orientation of a single keypoint.
pub fn estimate_orientation(
    image: ImageView<'_, f32>,
    kp: &Keypoint,
    method: OrientationMethod,
) -> Option<f32> {
    match method {
        OrientationMethod::IntensityCentroid { radius } => {
            intensity_centroid(image, kp, scaled_radius(radius, kp.scale))
        }
        OrientationMethod::GradientHistogram { radius, bins } => {
            gradient_histogram(image, kp, scaled_radius(radius, kp.scale), bins)
        }
    }
}

fn scaled_radius(radius: usize, scale: f32) -> isize {
    (radius as f32 * scale.max(f32::EPSILON)).round().max(1.0) as isize
}

fn disc_inside(image: ImageView<'_, f32>, cx: isize, cy: isize, reach: isize) -> bool {
    let inside = |c: isize, len: usize| {
        c.checked_sub(reach).is_some_and(|lo| lo >= 0)
            && c.checked_add(reach).is_some_and(|hi| hi < len as isize)
    };
    inside(cx, image.width()) && inside(cy, image.height())
}

fn intensity_centroid(image: ImageView<'_, f32>, kp: &Keypoint, radius: isize) -> Option<f32> {
    let cx = kp.x.round() as isize;
    let cy = kp.y.round() as isize;
    if !disc_inside(image, cx, cy, radius) {
        return None;
    }
    let r2 = radius * radius;
    let mut m10 = 0.0f32;
    let mut m01 = 0.0f32;
    for dy in -radius..=radius {
        let row = image.row((cy + dy) as usize)?;
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let v = row[(cx + dx) as usize];
            m10 += dx as f32 * v;
            m01 += dy as f32 * v;
        }
    }
    if m10 == 0.0 && m01 == 0.0 {
        return None;
    }
    Some(wrap_rad(m01.atan2(m10)))
}

fn gradient_histogram(
    image: ImageView<'_, f32>,
    kp: &Keypoint,
    radius: isize,
    bins: usize,
) -> Option<f32> {
    if bins < 3 {
        return None;
    }
    let cx = kp.x.round() as isize;
    let cy = kp.y.round() as isize;
    // Central differences need one extra pixel of margin.
    if !disc_inside(image, cx, cy, radius + 1) {
        return None;
    }
    let r2 = radius * radius;
    let sigma = radius as f32 * 0.5;
    let inv_two_sigma_sq = 1.0 / (2.0 * sigma * sigma);
    let bin_scale = bins as f32 / TAU;
    let mut hist = vec![0.0f32; bins];

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let x = cx + dx;
            let y = cy + dy;
            let gx = image.sample_clamped(x + 1, y) - image.sample_clamped(x - 1, y);
            let gy = image.sample_clamped(x, y + 1) - image.sample_clamped(x, y - 1);
            let mag = (gx * gx + gy * gy).sqrt();
            if mag == 0.0 {
                continue;
            }
            let weight = (-((dx * dx + dy * dy) as f32) * inv_two_sigma_sq).exp();
            let bin = (wrap_rad(gy.atan2(gx)) * bin_scale).round() as usize % bins;
            hist[bin] += weight * mag;
        }
    }

    let (best, &best_val) = hist
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(&a.0)))?;
    if best_val <= 0.0 {
        return None;
    }
    let left = hist[(best + bins - 1) % bins];
    let right = hist[(best + 1) % bins];
    let offset = parabolic_peak_offset(left, best_val, right).unwrap_or(0.0);
    Some(wrap_rad((best as f32 + offset) / bin_scale))
}
