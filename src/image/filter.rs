//! Box filtering with replicated borders.

use crate::image::{ImageView, OwnedImage};
use crate::util::{FeatScanError, FeatScanResult};

/// Separable `size x size` box sum over a contiguous buffer.
pub(crate) fn box_sum(src: &[f32], width: usize, height: usize, size: usize) -> Vec<f32> {
    let r = (size / 2) as isize;
    let clamp_x = |x: isize| x.clamp(0, width as isize - 1) as usize;
    let clamp_y = |y: isize| y.clamp(0, height as isize - 1) as usize;

    let mut rows = vec![0.0f32; src.len()];
    for y in 0..height {
        let base = y * width;
        for x in 0..width {
            let mut acc = 0.0f32;
            for dx in -r..=r {
                acc += src[base + clamp_x(x as isize + dx)];
            }
            rows[base + x] = acc;
        }
    }

    let mut out = vec![0.0f32; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for dy in -r..=r {
                acc += rows[clamp_y(y as isize + dy) * width + x];
            }
            out[y * width + x] = acc;
        }
    }
    out
}

/// Mean filter with an odd `size`; `size == 1` copies the image.
pub fn box_blur(src: ImageView<'_, f32>, size: usize) -> FeatScanResult<OwnedImage<f32>> {
    if size == 0 || size % 2 == 0 {
        return Err(FeatScanError::InvalidParameter {
            name: "size",
            reason: "must be odd and at least 1",
        });
    }
    let image = OwnedImage::from_view(src)?;
    if size == 1 {
        return Ok(image);
    }
    let (width, height) = (image.width(), image.height());
    let norm = 1.0 / (size * size) as f32;
    let mut out = box_sum(image.data(), width, height, size);
    for v in out.iter_mut() {
        *v *= norm;
    }
    OwnedImage::new(out, width, height)
}

#[cfg(test)]
mod tests {
    use super::{box_blur, box_sum};
    use crate::image::ImageView;

    #[test]
    fn box_sum_of_ones_counts_window() {
        let src = vec![1.0f32; 25];
        let out = box_sum(&src, 5, 5, 3);
        assert!(out.iter().all(|&v| (v - 9.0).abs() < 1e-6));
    }

    #[test]
    fn blur_spreads_single_spike() {
        let mut data = vec![0.0f32; 49];
        data[3 * 7 + 3] = 9.0;
        let view = ImageView::from_slice(&data, 7, 7).unwrap();
        let blurred = box_blur(view, 3).unwrap();
        let v = blurred.view();
        assert!((v.get(2, 2).copied().unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(v.get(0, 0).copied(), Some(0.0));
    }
}
