//! Corner response maps from the local gradient structure tensor.
//!
//! For every pixel the tensor `M = [[Sxx, Sxy], [Sxy, Syy]]` is accumulated
//! from Sobel gradient products over a `block_size x block_size` box with
//! replicated borders and normalised by the box area. The response is either
//! the smaller eigenvalue of `M` or the Harris measure `det(M) - k tr(M)^2`.

use crate::corner::ResponseKind;
use crate::image::filter::box_sum;
use crate::image::gradient::sobel_gradients;
use crate::image::{ImageView, OwnedImage, Pixel};
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatScanError, FeatScanResult};

/// Computes a response map with the same dimensions as `image`.
///
/// Identical inputs always produce identical maps.
pub fn corner_response<T: Pixel>(
    image: ImageView<'_, T>,
    kind: ResponseKind,
    block_size: usize,
) -> FeatScanResult<OwnedImage<f32>> {
    if block_size == 0 || block_size % 2 == 0 {
        return Err(FeatScanError::InvalidParameter {
            name: "block_size",
            reason: "must be odd and at least 1",
        });
    }
    let width = image.width();
    let height = image.height();
    let _span = trace_span!("corner_response", width = width, height = height).entered();

    let (gx, gy) = sobel_gradients(image)?;
    let (gx, gy) = (gx.data(), gy.data());
    let len = width * height;
    let mut xx = Vec::with_capacity(len);
    let mut yy = Vec::with_capacity(len);
    let mut xy = Vec::with_capacity(len);
    for (&dx, &dy) in gx.iter().zip(gy.iter()) {
        xx.push(dx * dx);
        yy.push(dy * dy);
        xy.push(dx * dy);
    }

    let sxx = box_sum(&xx, width, height, block_size);
    let syy = box_sum(&yy, width, height, block_size);
    let sxy = box_sum(&xy, width, height, block_size);
    let norm = 1.0 / (block_size * block_size) as f32;

    let mut response = Vec::with_capacity(len);
    for idx in 0..len {
        let a = sxx[idx] * norm;
        let c = syy[idx] * norm;
        let b = sxy[idx] * norm;
        let value = match kind {
            ResponseKind::MinEigen => {
                let half_trace = 0.5 * (a + c);
                let half_diff = 0.5 * (a - c);
                (half_trace - (half_diff * half_diff + b * b).sqrt()).max(0.0)
            }
            ResponseKind::Harris { k } => {
                let trace = a + c;
                a * c - b * b - k * trace * trace
            }
        };
        response.push(value);
    }

    trace_event!("corner_response_done", pixels = len);
    OwnedImage::new(response, width, height)
}

#[cfg(test)]
mod tests {
    use super::corner_response;
    use crate::corner::ResponseKind;
    use crate::image::ImageView;

    #[test]
    fn square_corner_beats_edge_and_flat() {
        let size = 32;
        let mut data = vec![0u8; size * size];
        for y in 10..size {
            for x in 10..size {
                data[y * size + x] = 200;
            }
        }
        let view = ImageView::from_slice(&data, size, size).unwrap();
        let resp = corner_response(view, ResponseKind::MinEigen, 3).unwrap();
        let r = resp.view();
        let corner = *r.get(10, 10).unwrap();
        let edge = *r.get(20, 10).unwrap();
        let flat = *r.get(3, 3).unwrap();
        assert!(corner > edge);
        assert!(edge <= corner * 1e-3);
        assert_eq!(flat, 0.0);
    }

    #[test]
    fn even_block_size_is_rejected() {
        let data = vec![0u8; 16];
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        assert!(corner_response(view, ResponseKind::MinEigen, 2).is_err());
    }
}
