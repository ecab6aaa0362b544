//! Resampling used by scale pyramids.

use crate::image::{ImageView, OwnedImage, Pixel};
use crate::util::{FeatScanError, FeatScanResult};

/// Resamples a view to `dst_width x dst_height` with bilinear interpolation.
///
/// Pixel centres are aligned: destination pixel `x` samples the source at
/// `(x + 0.5) * sx - 0.5` with `sx = src_width / dst_width`. When shrinking,
/// each output averages `ceil(sx) x ceil(sy)` bilinear taps spread over its
/// footprint so that coarse levels do not alias.
pub fn resize_bilinear<T: Pixel>(
    src: ImageView<'_, T>,
    dst_width: usize,
    dst_height: usize,
) -> FeatScanResult<OwnedImage<f32>> {
    if dst_width == 0 || dst_height == 0 {
        return Err(FeatScanError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    let sx = src.width() as f32 / dst_width as f32;
    let sy = src.height() as f32 / dst_height as f32;
    let taps_x = sx.ceil().max(1.0) as usize;
    let taps_y = sy.ceil().max(1.0) as usize;
    let inv_taps = 1.0 / (taps_x * taps_y) as f32;

    let mut out = Vec::with_capacity(dst_width * dst_height);
    for y in 0..dst_height {
        for x in 0..dst_width {
            let value = if taps_x == 1 && taps_y == 1 {
                src.sample_bilinear((x as f32 + 0.5) * sx - 0.5, (y as f32 + 0.5) * sy - 0.5)
            } else {
                let mut acc = 0.0f32;
                for ty in 0..taps_y {
                    let fy = y as f32 * sy + (ty as f32 + 0.5) * sy / taps_y as f32 - 0.5;
                    for tx in 0..taps_x {
                        let fx = x as f32 * sx + (tx as f32 + 0.5) * sx / taps_x as f32 - 0.5;
                        acc += src.sample_bilinear(fx, fy);
                    }
                }
                acc * inv_taps
            };
            out.push(value);
        }
    }
    OwnedImage::new(out, dst_width, dst_height)
}

#[cfg(test)]
mod tests {
    use super::resize_bilinear;
    use crate::image::ImageView;

    #[test]
    fn constant_image_stays_constant() {
        let data = vec![42u8; 30 * 20];
        let view = ImageView::from_slice(&data, 30, 20).unwrap();
        let small = resize_bilinear(view, 7, 5).unwrap();
        assert_eq!((small.width(), small.height()), (7, 5));
        assert!(small.data().iter().all(|v| (v - 42.0).abs() < 1e-4));
    }

    #[test]
    fn identity_size_copies_pixels() {
        let data: Vec<u8> = (0..16).collect();
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        let same = resize_bilinear(view, 4, 4).unwrap();
        for (a, b) in same.data().iter().zip(data.iter()) {
            assert!((a - *b as f32).abs() < 1e-5);
        }
    }
}
