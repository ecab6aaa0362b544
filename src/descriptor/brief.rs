//! Oriented BRIEF binary descriptor.
//!
//! Each bit compares the smoothed intensity at two points of a fixed test
//! pattern: bit `i` is set when `I(p_i) < I(q_i)`. Bits are packed
//! least-significant first. The pattern is drawn once, uniformly inside a
//! `patch_size` square, from a seeded PCG generator. PCG output is fixed
//! by its algorithm, so two extractors built from the same configuration
//! produce comparable descriptors across builds and platforms, as long as
//! the `rand` minor version (which fixes the range sampling) is unchanged. At
//! extraction the pattern is rotated by the keypoint orientation and scaled
//! by the keypoint scale, and points are sampled bilinearly.

use crate::descriptor::{DescriptorExtractor, Metric, OwnedDescriptor};
use crate::image::filter::box_blur;
use crate::image::{ImageView, OwnedImage};
use crate::keypoint::Keypoint;
use crate::util::math::rotate;
use crate::util::{FeatScanError, FeatScanResult};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::f32::consts::SQRT_2;

/// BRIEF parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BriefConfig {
    /// Side of the square the test points are drawn from (odd).
    pub patch_size: usize,
    /// Descriptor length in bytes; 8 tests per byte.
    pub bytes: usize,
    /// Odd mean-filter size applied before sampling; 1 disables smoothing.
    pub smoothing: usize,
    /// Seed for the test pattern.
    pub seed: u64,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            patch_size: 31,
            bytes: 32,
            smoothing: 5,
            seed: 0x0b51_ef00,
        }
    }
}

impl BriefConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> FeatScanResult<()> {
        if self.patch_size < 3 || self.patch_size % 2 == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "patch_size",
                reason: "must be odd and at least 3",
            });
        }
        if self.bytes == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "bytes",
                reason: "must be at least 1",
            });
        }
        if self.smoothing == 0 || self.smoothing % 2 == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "smoothing",
                reason: "must be odd and at least 1",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TestPair {
    p: (f32, f32),
    q: (f32, f32),
}

/// Binary descriptor extractor compared under Hamming distance.
#[derive(Clone, Debug)]
pub struct BriefExtractor {
    cfg: BriefConfig,
    pairs: Vec<TestPair>,
}

impl BriefExtractor {
    /// Builds the test pattern for `cfg`.
    pub fn new(cfg: BriefConfig) -> FeatScanResult<Self> {
        cfg.validate()?;
        let half = (cfg.patch_size / 2) as i32;
        let mut rng = Pcg64::seed_from_u64(cfg.seed);
        let point = |rng: &mut Pcg64| {
            (
                rng.random_range(-half..=half) as f32,
                rng.random_range(-half..=half) as f32,
            )
        };
        let mut pairs = Vec::with_capacity(cfg.bytes * 8);
        while pairs.len() < cfg.bytes * 8 {
            let p = point(&mut rng);
            let q = point(&mut rng);
            if p != q {
                pairs.push(TestPair { p, q });
            }
        }
        Ok(Self { cfg, pairs })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &BriefConfig {
        &self.cfg
    }
}

impl DescriptorExtractor for BriefExtractor {
    fn metric(&self) -> Metric {
        Metric::Hamming
    }

    fn descriptor_len(&self) -> usize {
        self.cfg.bytes
    }

    fn patch_radius(&self, kp: &Keypoint) -> f32 {
        // Rotated pattern corners plus one pixel for bilinear taps.
        (self.cfg.patch_size / 2) as f32 * SQRT_2 * kp.scale + 1.0
    }

    fn prepare(&self, image: ImageView<'_, f32>) -> FeatScanResult<OwnedImage<f32>> {
        box_blur(image, self.cfg.smoothing)
    }

    fn compute(&self, prepared: ImageView<'_, f32>, kp: &Keypoint) -> OwnedDescriptor {
        let (sin_a, cos_a) = kp.orientation.unwrap_or(0.0).sin_cos();
        let scale = kp.scale;
        let sample = |(dx, dy): (f32, f32)| {
            let (rx, ry) = rotate(dx * scale, dy * scale, sin_a, cos_a);
            prepared.sample_bilinear(kp.x + rx, kp.y + ry)
        };

        let mut out = vec![0u8; self.cfg.bytes];
        for (i, pair) in self.pairs.iter().enumerate() {
            if sample(pair.p) < sample(pair.q) {
                out[i / 8] |= 1 << (i % 8);
            }
        }
        OwnedDescriptor::Binary(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{BriefConfig, BriefExtractor};

    #[test]
    fn pattern_is_deterministic_per_seed() {
        let a = BriefExtractor::new(BriefConfig::default()).unwrap();
        let b = BriefExtractor::new(BriefConfig::default()).unwrap();
        assert_eq!(a.pairs, b.pairs);
        assert_eq!(a.pairs.len(), 256);

        let half = 15.0;
        assert!(a
            .pairs
            .iter()
            .all(|t| t.p.0.abs() <= half && t.p.1.abs() <= half && t.q.0.abs() <= half));
    }

    #[test]
    fn pattern_comes_from_portable_pcg_stream() {
        use rand::{Rng, SeedableRng};
        use rand_pcg::Pcg64;

        let cfg = BriefConfig::default();
        let extractor = BriefExtractor::new(cfg.clone()).unwrap();
        let mut rng = Pcg64::seed_from_u64(cfg.seed);
        let mut draw = || rng.random_range(-15i32..=15) as f32;
        let first = (draw(), draw(), draw(), draw());
        if (first.0, first.1) != (first.2, first.3) {
            let pair = &extractor.pairs[0];
            assert_eq!(pair.p, (first.0, first.1));
            assert_eq!(pair.q, (first.2, first.3));
        }
    }

    #[test]
    fn even_patch_size_is_rejected() {
        let cfg = BriefConfig {
            patch_size: 30,
            ..BriefConfig::default()
        };
        assert!(BriefExtractor::new(cfg).is_err());
    }
}
