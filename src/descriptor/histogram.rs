//! Gradient orientation histogram descriptor.
//!
//! The patch around a keypoint is divided into `cells x cells` spatial cells
//! of `cell_size * scale` pixels, in the keypoint's rotated frame. Every
//! pixel votes its Gaussian-weighted gradient magnitude into the
//! orientation histogram of its cell, split linearly between the two nearest
//! of `bins` orientation bins. Orientations are measured relative to the
//! keypoint orientation. The concatenated histograms are L2 normalised,
//! clamped at `magnitude_cap` and normalised again.

use crate::descriptor::{DescriptorExtractor, Metric, OwnedDescriptor};
use crate::image::ImageView;
use crate::keypoint::Keypoint;
use crate::util::math::{rotate, wrap_rad};
use crate::util::{FeatScanError, FeatScanResult};
use std::f32::consts::{SQRT_2, TAU};

/// Histogram descriptor parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistogramConfig {
    /// Cells per side of the descriptor grid.
    pub cells: usize,
    /// Orientation bins per cell.
    pub bins: usize,
    /// Cell side in pixels at scale 1.
    pub cell_size: f32,
    /// Per-component cap applied after the first normalisation.
    pub magnitude_cap: f32,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            cells: 4,
            bins: 8,
            cell_size: 4.0,
            magnitude_cap: 0.2,
        }
    }
}

impl HistogramConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> FeatScanResult<()> {
        if self.cells == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "cells",
                reason: "must be at least 1",
            });
        }
        if self.bins < 2 {
            return Err(FeatScanError::InvalidParameter {
                name: "bins",
                reason: "must be at least 2",
            });
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "cell_size",
                reason: "must be finite and positive",
            });
        }
        if !(self.magnitude_cap > 0.0 && self.magnitude_cap <= 1.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "magnitude_cap",
                reason: "must be in (0, 1]",
            });
        }
        Ok(())
    }
}

/// Float descriptor extractor compared under L2 distance.
#[derive(Clone, Debug)]
pub struct HistogramExtractor {
    cfg: HistogramConfig,
}

impl HistogramExtractor {
    /// Creates an extractor after validating `cfg`.
    pub fn new(cfg: HistogramConfig) -> FeatScanResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &HistogramConfig {
        &self.cfg
    }

    fn half_extent(&self, kp: &Keypoint) -> f32 {
        0.5 * self.cfg.cells as f32 * self.cfg.cell_size * kp.scale
    }
}

impl DescriptorExtractor for HistogramExtractor {
    fn metric(&self) -> Metric {
        Metric::L2
    }

    fn descriptor_len(&self) -> usize {
        self.cfg.cells * self.cfg.cells * self.cfg.bins
    }

    fn patch_radius(&self, kp: &Keypoint) -> f32 {
        // Rotated grid corners plus one pixel for central differences.
        self.half_extent(kp) * SQRT_2 + 1.0
    }

    fn compute(&self, prepared: ImageView<'_, f32>, kp: &Keypoint) -> OwnedDescriptor {
        let cells = self.cfg.cells;
        let bins = self.cfg.bins;
        let angle = kp.orientation.unwrap_or(0.0);
        // Inverse rotation maps image offsets into the keypoint frame.
        let (sin_inv, cos_inv) = (-angle).sin_cos();
        let cell_px = self.cfg.cell_size * kp.scale;
        let half = self.half_extent(kp);
        let reach = (half * SQRT_2).ceil() as isize;
        let sigma = half;
        let inv_two_sigma_sq = 1.0 / (2.0 * sigma * sigma);
        let bins_per_rad = bins as f32 / TAU;

        let cx = kp.x.round() as isize;
        let cy = kp.y.round() as isize;
        // Sub-pixel offset of the keypoint from its anchor pixel.
        let (frac_x, frac_y) = (kp.x - kp.x.round(), kp.y - kp.y.round());
        let mut hist = vec![0.0f32; self.descriptor_len()];

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let ox = dx as f32 - frac_x;
                let oy = dy as f32 - frac_y;
                let (rx, ry) = rotate(ox, oy, sin_inv, cos_inv);
                if rx.abs() >= half || ry.abs() >= half {
                    continue;
                }
                let col = ((rx + half) / cell_px) as usize;
                let row = ((ry + half) / cell_px) as usize;
                if col >= cells || row >= cells {
                    continue;
                }

                let x = cx.saturating_add(dx);
                let y = cy.saturating_add(dy);
                let gx = prepared.sample_clamped(x.saturating_add(1), y)
                    - prepared.sample_clamped(x.saturating_sub(1), y);
                let gy = prepared.sample_clamped(x, y.saturating_add(1))
                    - prepared.sample_clamped(x, y.saturating_sub(1));
                let mag = (gx * gx + gy * gy).sqrt();
                if mag == 0.0 {
                    continue;
                }
                let weight = (-(rx * rx + ry * ry) * inv_two_sigma_sq).exp() * mag;

                let rel = wrap_rad(gy.atan2(gx) - angle) * bins_per_rad;
                let lower = rel.floor();
                let frac = rel - lower;
                let b0 = lower as usize % bins;
                let b1 = (b0 + 1) % bins;
                let base = (row * cells + col) * bins;
                hist[base + b0] += weight * (1.0 - frac);
                hist[base + b1] += weight * frac;
            }
        }

        normalize_capped(&mut hist, self.cfg.magnitude_cap);
        OwnedDescriptor::Float(hist)
    }
}

fn normalize_capped(hist: &mut [f32], cap: f32) {
    let norm = hist.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return;
    }
    for v in hist.iter_mut() {
        *v = (*v / norm).min(cap);
    }
    let norm = hist.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in hist.iter_mut() {
            *v /= norm;
        }
    }
}
