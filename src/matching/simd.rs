//! SIMD L2 distance using the `wide` crate.
//!
//! Eight components are processed per step with `f32x8`; the tail falls back
//! to scalar accumulation.

use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// Squared Euclidean distance, vectorised.
pub(crate) fn l2_squared_simd(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let simd_end = len / LANES * LANES;
    let mut acc = f32x8::ZERO;
    let mut i = 0;
    while i < simd_end {
        let d = load_f32x8(&a[i..i + LANES]) - load_f32x8(&b[i..i + LANES]);
        acc += d * d;
        i += LANES;
    }
    let mut tail = 0.0f32;
    for j in simd_end..len {
        let d = a[j] - b[j];
        tail += d * d;
    }
    hsum(acc) + tail
}
