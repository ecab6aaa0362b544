//! Histogram-of-oriented-gradients window features and a linear scorer.
//!
//! Gradients are central differences with replicated borders. Each pixel
//! votes its magnitude into the two nearest unsigned orientation bins of its
//! cell. Cells are grouped into overlapping blocks that are L2-normalised,
//! clipped and renormalised (L2-Hys).

use crate::detect::scan::WindowScorer;
use crate::image::ImageView;
use crate::util::{FeatScanError, FeatScanResult};
use std::f32::consts::PI;

const NORM_EPS: f32 = 1e-6;

/// HOG layout parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HogConfig {
    /// Cell side in pixels.
    pub cell_size: usize,
    /// Block side in cells.
    pub block_cells: usize,
    /// Step between blocks in cells.
    pub block_stride_cells: usize,
    /// Orientation bins over [0, 180) degrees.
    pub bins: usize,
    /// Clip value applied between the two block normalisations.
    pub clip: f32,
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            cell_size: 8,
            block_cells: 2,
            block_stride_cells: 1,
            bins: 9,
            clip: 0.2,
        }
    }
}

impl HogConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> FeatScanResult<()> {
        if self.cell_size == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "cell_size",
                reason: "must be at least 1",
            });
        }
        if self.block_cells == 0 || self.block_stride_cells == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "block_cells",
                reason: "block size and block stride must be at least 1",
            });
        }
        if self.bins == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "bins",
                reason: "must be at least 1",
            });
        }
        if !(self.clip > 0.0 && self.clip.is_finite()) {
            return Err(FeatScanError::InvalidParameter {
                name: "clip",
                reason: "must be a positive finite value",
            });
        }
        Ok(())
    }
}

/// HOG feature extractor for a fixed window size.
#[derive(Clone, Debug)]
pub struct HogDescriptor {
    cfg: HogConfig,
    window: (usize, usize),
    cells: (usize, usize),
    blocks: (usize, usize),
}

impl HogDescriptor {
    /// Creates an extractor for `window = (width, height)`.
    ///
    /// The window must be a whole number of cells and hold at least one block.
    pub fn new(cfg: HogConfig, window: (usize, usize)) -> FeatScanResult<Self> {
        cfg.validate()?;
        let (win_w, win_h) = window;
        if win_w == 0 || win_h == 0 || win_w % cfg.cell_size != 0 || win_h % cfg.cell_size != 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "window",
                reason: "must be a non-zero multiple of cell_size",
            });
        }
        let cells = (win_w / cfg.cell_size, win_h / cfg.cell_size);
        if cells.0 < cfg.block_cells || cells.1 < cfg.block_cells {
            return Err(FeatScanError::InvalidParameter {
                name: "window",
                reason: "must hold at least one block",
            });
        }
        let blocks = (
            (cells.0 - cfg.block_cells) / cfg.block_stride_cells + 1,
            (cells.1 - cfg.block_cells) / cfg.block_stride_cells + 1,
        );
        Ok(Self {
            cfg,
            window,
            cells,
            blocks,
        })
    }

    /// Returns the layout parameters.
    pub fn config(&self) -> &HogConfig {
        &self.cfg
    }

    /// Returns the window size this extractor expects.
    pub fn window(&self) -> (usize, usize) {
        self.window
    }

    /// Number of values [`HogDescriptor::compute`] returns.
    pub fn feature_len(&self) -> usize {
        let block_len = self.cfg.block_cells * self.cfg.block_cells * self.cfg.bins;
        self.blocks.0 * self.blocks.1 * block_len
    }

    /// Computes the feature vector of a window-sized patch.
    pub fn compute(&self, patch: ImageView<'_, f32>) -> FeatScanResult<Vec<f32>> {
        if (patch.width(), patch.height()) != self.window {
            return Err(FeatScanError::InvalidInput(
                "patch size does not match the HOG window",
            ));
        }
        let cell_hist = self.cell_histograms(patch);
        let bins = self.cfg.bins;
        let bc = self.cfg.block_cells;
        let step = self.cfg.block_stride_cells;

        let mut out = Vec::with_capacity(self.feature_len());
        let mut block = Vec::with_capacity(bc * bc * bins);
        for by in 0..self.blocks.1 {
            for bx in 0..self.blocks.0 {
                block.clear();
                for cy in by * step..by * step + bc {
                    for cx in bx * step..bx * step + bc {
                        let start = (cy * self.cells.0 + cx) * bins;
                        block.extend_from_slice(&cell_hist[start..start + bins]);
                    }
                }
                l2_hys(&mut block, self.cfg.clip);
                out.extend_from_slice(&block);
            }
        }
        Ok(out)
    }

    fn cell_histograms(&self, patch: ImageView<'_, f32>) -> Vec<f32> {
        let bins = self.cfg.bins;
        let cell = self.cfg.cell_size;
        let bin_width = PI / bins as f32;
        let mut hist = vec![0.0f32; self.cells.0 * self.cells.1 * bins];

        for y in 0..self.window.1 {
            let yi = y as isize;
            for x in 0..self.window.0 {
                let xi = x as isize;
                let gx = patch.sample_clamped(xi + 1, yi) - patch.sample_clamped(xi - 1, yi);
                let gy = patch.sample_clamped(xi, yi + 1) - patch.sample_clamped(xi, yi - 1);
                let mag = (gx * gx + gy * gy).sqrt();
                if mag == 0.0 {
                    continue;
                }
                let mut angle = gy.atan2(gx);
                if angle < 0.0 {
                    angle += PI;
                }
                let pos = angle / bin_width - 0.5;
                let lo = pos.floor();
                let frac = pos - lo;
                let lo = (lo as isize).rem_euclid(bins as isize) as usize;
                let hi = (lo + 1) % bins;

                let base = ((y / cell) * self.cells.0 + x / cell) * bins;
                hist[base + lo] += mag * (1.0 - frac);
                hist[base + hi] += mag * frac;
            }
        }
        hist
    }
}

fn l2_hys(block: &mut [f32], clip: f32) {
    normalize(block);
    for v in block.iter_mut() {
        *v = v.min(clip);
    }
    normalize(block);
}

fn normalize(values: &mut [f32]) {
    let norm = (values.iter().map(|v| v * v).sum::<f32>() + NORM_EPS * NORM_EPS).sqrt();
    for v in values.iter_mut() {
        *v /= norm;
    }
}

/// Linear classifier over HOG features: `score = w . hog(patch) + bias`.
#[derive(Clone, Debug)]
pub struct LinearClassifier {
    hog: HogDescriptor,
    weights: Vec<f32>,
    bias: f32,
}

impl LinearClassifier {
    /// Creates a classifier; `weights` must have one entry per HOG value.
    pub fn new(hog: HogDescriptor, weights: Vec<f32>, bias: f32) -> FeatScanResult<Self> {
        if weights.len() != hog.feature_len() {
            return Err(FeatScanError::InvalidParameter {
                name: "weights",
                reason: "length must equal the HOG feature length",
            });
        }
        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(FeatScanError::InvalidParameter {
                name: "weights",
                reason: "weights and bias must be finite",
            });
        }
        Ok(Self { hog, weights, bias })
    }

    /// Returns the feature extractor.
    pub fn hog(&self) -> &HogDescriptor {
        &self.hog
    }

    /// Scores a patch, propagating feature errors.
    pub fn decision(&self, patch: ImageView<'_, f32>) -> FeatScanResult<f32> {
        let features = self.hog.compute(patch)?;
        let dot: f32 = features
            .iter()
            .zip(&self.weights)
            .map(|(f, w)| f * w)
            .sum();
        Ok(dot + self.bias)
    }
}

impl WindowScorer for LinearClassifier {
    /// Returns negative infinity for patches of the wrong size.
    fn score(&self, patch: ImageView<'_, f32>) -> f32 {
        self.decision(patch).unwrap_or(f32::NEG_INFINITY)
    }
}
