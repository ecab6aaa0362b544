//! Sobel image gradients.
//!
//! The 3x3 Sobel operator is applied separably with replicated borders:
//! derivative `[-1, 0, 1]` along one axis and smoothing `[1, 2, 1]` along the
//! other. Outputs are unnormalised.

use crate::image::{ImageView, OwnedImage, Pixel};
use crate::util::FeatScanResult;

/// Computes the horizontal and vertical Sobel gradients of a view.
pub fn sobel_gradients<T: Pixel>(
    src: ImageView<'_, T>,
) -> FeatScanResult<(OwnedImage<f32>, OwnedImage<f32>)> {
    let width = src.width();
    let height = src.height();
    let len = width * height;

    // Horizontal pass: derivative and smoothing along x.
    let mut dx_rows = vec![0.0f32; len];
    let mut sx_rows = vec![0.0f32; len];
    for y in 0..height {
        let yi = y as isize;
        for x in 0..width {
            let xi = x as isize;
            let l = src.sample_clamped(xi - 1, yi);
            let c = src.sample_clamped(xi, yi);
            let r = src.sample_clamped(xi + 1, yi);
            dx_rows[y * width + x] = r - l;
            sx_rows[y * width + x] = l + 2.0 * c + r;
        }
    }

    // Vertical pass: smooth the x-derivative, differentiate the x-smoothing.
    let mut gx = vec![0.0f32; len];
    let mut gy = vec![0.0f32; len];
    for y in 0..height {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(height - 1);
        for x in 0..width {
            gx[y * width + x] =
                dx_rows[up * width + x] + 2.0 * dx_rows[y * width + x] + dx_rows[down * width + x];
            gy[y * width + x] = sx_rows[down * width + x] - sx_rows[up * width + x];
        }
    }

    Ok((
        OwnedImage::new(gx, width, height)?,
        OwnedImage::new(gy, width, height)?,
    ))
}
