//! Descriptor distances.

use crate::descriptor::Descriptor;
use crate::util::{FeatScanError, FeatScanResult};

/// Number of differing bits between two byte strings of equal length.
pub fn hamming(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());
    let mut chunks_a = a.chunks_exact(8);
    let mut chunks_b = b.chunks_exact(8);
    let mut bits = 0u32;
    for (ca, cb) in chunks_a.by_ref().zip(chunks_b.by_ref()) {
        let wa = u64::from_le_bytes(ca.try_into().expect("chunk of 8 bytes"));
        let wb = u64::from_le_bytes(cb.try_into().expect("chunk of 8 bytes"));
        bits += (wa ^ wb).count_ones();
    }
    for (x, y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        bits += (x ^ y).count_ones();
    }
    bits
}

/// Squared Euclidean distance between two vectors of equal length.
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    #[cfg(feature = "simd")]
    {
        crate::matching::simd::l2_squared_simd(a, b)
    }
    #[cfg(not(feature = "simd"))]
    {
        l2_squared_scalar(a, b)
    }
}

#[cfg_attr(feature = "simd", allow(dead_code))]
pub(crate) fn l2_squared_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance between two vectors of equal length.
pub fn l2(a: &[f32], b: &[f32]) -> f32 {
    l2_squared(a, b).sqrt()
}

/// Distance between two descriptors under their shared metric.
///
/// Fails with `IncompatibleDescriptors` when the metrics or lengths differ.
pub fn descriptor_distance(a: Descriptor<'_>, b: Descriptor<'_>) -> FeatScanResult<f32> {
    if a.len() != b.len() {
        return Err(FeatScanError::IncompatibleDescriptors {
            reason: "descriptor lengths differ",
        });
    }
    match (a, b) {
        (Descriptor::Binary(x), Descriptor::Binary(y)) => Ok(hamming(x, y) as f32),
        (Descriptor::Float(x), Descriptor::Float(y)) => Ok(l2(x, y)),
        _ => Err(FeatScanError::IncompatibleDescriptors {
            reason: "descriptor metrics differ",
        }),
    }
}
