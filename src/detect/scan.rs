//! Sliding-window scanning over a scale pyramid.
//!
//! Level `k` is the base image resampled by `1 / s^k`, padded on every side
//! by replicating its border pixels. The window visits every position of the
//! padded level on a `stride` grid, as a zero-copy ROI. Accepted windows are
//! mapped back to base coordinates by removing the padding offset and
//! multiplying by the per-axis ratio of base size to rounded level size.
//! Scanning stops at the first level smaller than the
//! window on either side.

use crate::detect::DetectionWindow;
use crate::image::pyramid::{level_ratio, level_size};
use crate::image::resize::resize_bilinear;
use crate::image::{ImageView, OwnedImage, Pixel};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{FeatScanError, FeatScanResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Window scoring capability: higher means more likely a target.
pub trait WindowScorer {
    /// Scores a window-sized patch.
    fn score(&self, patch: ImageView<'_, f32>) -> f32;
}

impl<F> WindowScorer for F
where
    F: Fn(ImageView<'_, f32>) -> f32,
{
    fn score(&self, patch: ImageView<'_, f32>) -> f32 {
        self(patch)
    }
}

/// Scanner parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanConfig {
    /// Window `(width, height)` in level pixels.
    pub window: (usize, usize),
    /// Ratio between consecutive pyramid levels, greater than 1.
    pub scale_factor: f64,
    /// Step `(x, y)` between window positions.
    pub stride: (usize, usize),
    /// Replicated border `(x, y)` added around each level.
    pub padding: (usize, usize),
    /// Windows scoring at least this value are reported.
    pub acceptance_threshold: f32,
    /// Upper bound on scanned levels.
    pub max_levels: usize,
    /// Scan levels and rows on the rayon pool when the feature is enabled.
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window: (64, 128),
            scale_factor: 1.05,
            stride: (8, 8),
            padding: (8, 8),
            acceptance_threshold: 0.0,
            max_levels: 64,
            parallel: false,
        }
    }
}

impl ScanConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> FeatScanResult<()> {
        if self.window.0 == 0 || self.window.1 == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "window",
                reason: "both sides must be at least 1",
            });
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 1.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "scale_factor",
                reason: "must be a finite value greater than 1",
            });
        }
        if self.stride.0 == 0 || self.stride.1 == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "stride",
                reason: "both steps must be at least 1",
            });
        }
        if self.acceptance_threshold.is_nan() {
            return Err(FeatScanError::InvalidParameter {
                name: "acceptance_threshold",
                reason: "must not be NaN",
            });
        }
        if self.max_levels == 0 {
            return Err(FeatScanError::InvalidParameter {
                name: "max_levels",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Progress of a level-by-level scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// No level scanned yet.
    Idle,
    /// Level `k` was the last one scanned.
    ScanningLevel(usize),
    /// The pyramid is exhausted.
    Done,
}

/// Sliding-window scanner.
#[derive(Clone, Debug)]
pub struct WindowScanner {
    cfg: ScanConfig,
}

impl WindowScanner {
    /// Creates a scanner after validating `cfg`.
    pub fn new(cfg: ScanConfig) -> FeatScanResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.cfg
    }

    /// Size of level `k`, or `None` when it is below the window.
    fn level_geometry(&self, width: usize, height: usize, k: usize) -> Option<(usize, usize)> {
        if k >= self.cfg.max_levels {
            return None;
        }
        let scale = self.cfg.scale_factor.powi(k as i32);
        level_size(width, height, scale, self.cfg.window)
    }

    /// Number of levels a `width x height` image produces.
    pub fn level_count(&self, width: usize, height: usize) -> usize {
        (0..self.cfg.max_levels)
            .take_while(|&k| self.level_geometry(width, height, k).is_some())
            .count()
    }

    /// Returns a lazy level-by-level scan.
    pub fn levels<'a, T, S>(&'a self, image: ImageView<'a, T>, scorer: &'a S) -> ScanLevels<'a, T, S>
    where
        T: Pixel,
        S: WindowScorer + Sync + ?Sized,
    {
        ScanLevels {
            scanner: self,
            image,
            scorer,
            state: ScanState::Idle,
        }
    }

    /// Scans every level and returns accepted windows, level by level in
    /// raster order within each level.
    pub fn scan<T, S>(&self, image: ImageView<'_, T>, scorer: &S) -> FeatScanResult<Vec<DetectionWindow>>
    where
        T: Pixel,
        S: WindowScorer + Sync + ?Sized,
    {
        let _span = trace_span!(
            "window_scan",
            width = image.width(),
            height = image.height(),
            parallel = self.cfg.parallel
        )
        .entered();

        #[cfg(feature = "rayon")]
        if self.cfg.parallel {
            let levels = self.level_count(image.width(), image.height());
            let per_level: Vec<FeatScanResult<Vec<DetectionWindow>>> = (0..levels)
                .into_par_iter()
                .map(|k| self.scan_level(image, scorer, k).map(Option::unwrap_or_default))
                .collect();
            let mut out = Vec::new();
            for level in per_level {
                out.extend(level?);
            }
            trace_event!("windows_accepted", count = out.len(), levels = levels);
            return Ok(out);
        }

        let mut out = Vec::new();
        for level in self.levels(image, scorer) {
            out.extend(level?);
        }
        trace_event!("windows_accepted", count = out.len());
        Ok(out)
    }

    /// Scans level `k`; `Ok(None)` when the level is below the window.
    fn scan_level<T, S>(
        &self,
        image: ImageView<'_, T>,
        scorer: &S,
        k: usize,
    ) -> FeatScanResult<Option<Vec<DetectionWindow>>>
    where
        T: Pixel,
        S: WindowScorer + Sync + ?Sized,
    {
        let Some((width, height)) = self.level_geometry(image.width(), image.height(), k) else {
            return Ok(None);
        };
        let (ratio_x, ratio_y) = level_ratio((image.width(), image.height()), (width, height));
        let _span = trace_span!("scan_level", level = k, width = width, height = height).entered();

        let level = if k == 0 {
            OwnedImage::from_view(image)?
        } else {
            resize_bilinear(image, width, height)?
        };
        let (pad_x, pad_y) = self.cfg.padding;
        let padded = level.padded_replicate(pad_x, pad_y)?;
        let view = padded.view();
        let (win_w, win_h) = self.cfg.window;
        let (step_x, step_y) = self.cfg.stride;
        let rows: Vec<usize> = (0..=view.height() - win_h).step_by(step_y).collect();
        let cols: Vec<usize> = (0..=view.width() - win_w).step_by(step_x).collect();

        let scan_row = |y: usize| -> FeatScanResult<Vec<DetectionWindow>> {
            let mut found = Vec::new();
            for &x in &cols {
                let patch = view.roi(x, y, win_w, win_h)?;
                let confidence = scorer.score(patch);
                if confidence >= self.cfg.acceptance_threshold {
                    found.push(DetectionWindow {
                        x: ((x as f64 - pad_x as f64) * ratio_x) as f32,
                        y: ((y as f64 - pad_y as f64) * ratio_y) as f32,
                        width: (win_w as f64 * ratio_x) as f32,
                        height: (win_h as f64 * ratio_y) as f32,
                        confidence,
                        level: k,
                    });
                }
            }
            Ok(found)
        };

        #[cfg(feature = "rayon")]
        let per_row: Vec<FeatScanResult<Vec<DetectionWindow>>> = if self.cfg.parallel {
            rows.par_iter().map(|&y| scan_row(y)).collect()
        } else {
            rows.iter().map(|&y| scan_row(y)).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let per_row: Vec<FeatScanResult<Vec<DetectionWindow>>> =
            rows.iter().map(|&y| scan_row(y)).collect();

        let mut out = Vec::new();
        for row in per_row {
            out.extend(row?);
        }
        trace_debug!("level_scanned", level = k, windows = rows.len() * cols.len(), accepted = out.len());
        Ok(Some(out))
    }
}

/// Lazy scan yielding the accepted windows of one level per step.
///
/// State moves `Idle -> ScanningLevel(0) -> ScanningLevel(1) -> ... -> Done`
/// and ends at the first level smaller than the window.
pub struct ScanLevels<'a, T, S: ?Sized> {
    scanner: &'a WindowScanner,
    image: ImageView<'a, T>,
    scorer: &'a S,
    state: ScanState,
}

impl<T, S: ?Sized> ScanLevels<'_, T, S> {
    /// Returns the current scan state.
    pub fn state(&self) -> ScanState {
        self.state
    }
}

impl<T, S> Iterator for ScanLevels<'_, T, S>
where
    T: Pixel,
    S: WindowScorer + Sync + ?Sized,
{
    type Item = FeatScanResult<Vec<DetectionWindow>>;

    fn next(&mut self) -> Option<Self::Item> {
        let k = match self.state {
            ScanState::Idle => 0,
            ScanState::ScanningLevel(k) => k + 1,
            ScanState::Done => return None,
        };
        match self.scanner.scan_level(self.image, self.scorer, k) {
            Ok(Some(found)) => {
                self.state = ScanState::ScanningLevel(k);
                Some(Ok(found))
            }
            Ok(None) => {
                self.state = ScanState::Done;
                None
            }
            Err(err) => {
                self.state = ScanState::Done;
                Some(Err(err))
            }
        }
    }
}
