//! Adapters from `image` crate buffers.
//!
//! Available when the `image-io` feature is enabled. Decoding and encoding
//! stay with the `image` crate; these helpers only reinterpret its buffers.

use crate::image::{ImageBuffer, ImageView, OwnedImage};
use crate::util::FeatScanResult;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> FeatScanResult<ImageView<'_, u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    ImageView::from_slice(img.as_raw(), width, height)
}

/// Copies an RGB image into a three channel buffer.
pub fn buffer_from_rgb_image(img: &image::RgbImage) -> FeatScanResult<ImageBuffer<u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    ImageBuffer::new(img.as_raw().clone(), width, height, 3)
}

/// Converts any decoded image into a single `f32` luminance channel.
pub fn gray_from_dynamic_image(img: &image::DynamicImage) -> FeatScanResult<OwnedImage<f32>> {
    let rgba = img.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    ImageBuffer::new(rgba.into_raw(), width, height, 4)?.to_gray()
}
