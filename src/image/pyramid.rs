//! Scale pyramid construction.
//!
//! Level `k` has scale `s^k` relative to the base image and dimensions
//! `round(W / s^k) x round(H / s^k)`. Every level is resampled directly from
//! the base so blur does not accumulate across levels. Level 0 is a plain
//! `f32` copy of the input.

use crate::image::resize::resize_bilinear;
use crate::image::{ImageView, OwnedImage, Pixel};
use crate::util::{FeatScanError, FeatScanResult};

/// One pyramid level with its cumulative scale.
#[derive(Clone, Debug)]
pub struct PyramidLevel {
    image: OwnedImage<f32>,
    scale: f64,
    ratio: (f64, f64),
}

impl PyramidLevel {
    /// Returns the level image.
    pub fn image(&self) -> &OwnedImage<f32> {
        &self.image
    }

    /// Returns the nominal scale `s^k` of this level.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the per-axis factors mapping level pixels back to level 0.
    ///
    /// Level sizes are rounded, so these differ slightly from [`scale`].
    ///
    /// [`scale`]: PyramidLevel::scale
    pub fn ratio(&self) -> (f64, f64) {
        self.ratio
    }
}

/// Per-axis ratio between the base size and a rounded level size.
pub(crate) fn level_ratio(base: (usize, usize), level: (usize, usize)) -> (f64, f64) {
    (
        base.0 as f64 / level.0 as f64,
        base.1 as f64 / level.1 as f64,
    )
}

/// Owned image pyramid built from a base level.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<PyramidLevel>,
}

/// Returns the size of level `k`, or `None` once it falls below `min_size`.
pub(crate) fn level_size(
    base_width: usize,
    base_height: usize,
    scale: f64,
    min_size: (usize, usize),
) -> Option<(usize, usize)> {
    let width = (base_width as f64 / scale).round() as usize;
    let height = (base_height as f64 / scale).round() as usize;
    if width == 0 || height == 0 || width < min_size.0 || height < min_size.1 {
        return None;
    }
    Some((width, height))
}

impl ImagePyramid {
    /// Builds levels until either side drops below `min_size` or
    /// `max_levels` levels exist.
    ///
    /// The base level is always present when it is at least `min_size`;
    /// otherwise the pyramid is empty.
    pub fn build<T: Pixel>(
        base: ImageView<'_, T>,
        scale_factor: f64,
        min_size: (usize, usize),
        max_levels: usize,
    ) -> FeatScanResult<Self> {
        if !(scale_factor.is_finite() && scale_factor > 1.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "scale_factor",
                reason: "must be a finite value greater than 1",
            });
        }

        let mut levels = Vec::new();
        for k in 0..max_levels {
            let scale = scale_factor.powi(k as i32);
            let Some((width, height)) = level_size(base.width(), base.height(), scale, min_size)
            else {
                break;
            };
            let image = if k == 0 {
                OwnedImage::from_view(base)?
            } else {
                resize_bilinear(base, width, height)?
            };
            let ratio = level_ratio((base.width(), base.height()), (width, height));
            levels.push(PyramidLevel {
                image,
                scale,
                ratio,
            });
        }

        Ok(Self { levels })
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// Returns a view for a specific pyramid level.
    pub fn level(&self, index: usize) -> Option<ImageView<'_, f32>> {
        self.levels.get(index).map(|level| level.image.view())
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true when no level satisfied the minimum size.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
