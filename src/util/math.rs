//! Geometry helpers shared by orientation and descriptor code.

use std::f32::consts::TAU;

/// Wraps an angle in radians to the range [0, 2π).
pub(crate) fn wrap_rad(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Rotates `(dx, dy)` by an angle given as `(sin, cos)`.
#[inline]
pub(crate) fn rotate(dx: f32, dy: f32, sin_a: f32, cos_a: f32) -> (f32, f32) {
    (cos_a * dx - sin_a * dy, sin_a * dx + cos_a * dy)
}

/// Offset of the vertex of a parabola through three equally spaced samples.
///
/// Returns a value in `[-0.5, 0.5]` relative to the centre sample, or `None`
/// when the samples are collinear.
pub(crate) fn parabolic_peak_offset(left: f32, center: f32, right: f32) -> Option<f32> {
    let denom = left - 2.0 * center + right;
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    Some((0.5 * (left - right) / denom).clamp(-0.5, 0.5))
}

#[cfg(test)]
mod tests {
    use super::{parabolic_peak_offset, rotate, wrap_rad};
    use std::f32::consts::{FRAC_PI_2, TAU};

    #[test]
    fn wrap_rad_maps_to_expected_range() {
        assert!((wrap_rad(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_rad(TAU + 0.25) - 0.25).abs() < 1e-5);
        assert!(wrap_rad(TAU) < 1e-5);
    }

    #[test]
    fn rotate_quarter_turn() {
        let (sin, cos) = FRAC_PI_2.sin_cos();
        let (x, y) = rotate(1.0, 0.0, sin, cos);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn parabolic_peak_is_centered_for_symmetric_samples() {
        assert_eq!(parabolic_peak_offset(1.0, 2.0, 1.0), Some(0.0));
        assert!(parabolic_peak_offset(1.0, 1.0, 1.0).is_none());
        let offset = parabolic_peak_offset(1.0, 2.0, 1.5).unwrap();
        assert!(offset > 0.0 && offset < 0.5);
    }
}
