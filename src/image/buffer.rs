//! Owned interleaved multi-channel pixel buffer.

use crate::image::{required_len, ImageView, OwnedImage, Pixel};
use crate::util::{FeatScanError, FeatScanResult};

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Decoded image with `channels` interleaved samples per pixel.
///
/// Channel order for 3 and 4 channel images is RGB(A). Two channel images
/// are treated as gray + alpha.
#[derive(Clone, Debug)]
pub struct ImageBuffer<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    channels: usize,
}

impl<T: Pixel> ImageBuffer<T> {
    /// Wraps decoded pixel data; `data.len()` must equal
    /// `width * height * channels`.
    pub fn new(data: Vec<T>, width: usize, height: usize, channels: usize) -> FeatScanResult<Self> {
        if !(1..=4).contains(&channels) {
            return Err(FeatScanError::InvalidInput("channel count must be 1 to 4"));
        }
        let pixels = required_len(width, height, width)?;
        let needed = pixels
            .checked_mul(channels)
            .ok_or(FeatScanError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(FeatScanError::ChannelMismatch {
                channels,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the interleaved pixel data.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns a view when the buffer has a single channel.
    pub fn gray_view(&self) -> Option<ImageView<'_, T>> {
        if self.channels != 1 {
            return None;
        }
        ImageView::from_slice(&self.data, self.width, self.height).ok()
    }

    /// Reduces the buffer to one `f32` luminance channel.
    pub fn to_gray(&self) -> FeatScanResult<OwnedImage<f32>> {
        let gray = self
            .data
            .chunks_exact(self.channels)
            .map(|px| match px {
                [v] | [v, _] => v.to_f32(),
                [r, g, b] | [r, g, b, _] => {
                    LUMA_R * r.to_f32() + LUMA_G * g.to_f32() + LUMA_B * b.to_f32()
                }
                _ => 0.0,
            })
            .collect();
        OwnedImage::new(gray, self.width, self.height)
    }
}
