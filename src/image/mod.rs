//! Image views, owned buffers and pyramid utilities.
//!
//! `ImageView` is a borrowed single-channel 2D view into a 1D buffer with an
//! explicit stride. The stride counts elements between the starts of
//! consecutive rows, so a stride larger than the width represents padded rows.
//! ROI slices are zero-copy views into the same backing slice and retain the
//! original stride. Multi-channel input enters through [`ImageBuffer`] and is
//! reduced to a single `f32` channel before any algorithm runs.

use crate::util::{FeatScanError, FeatScanResult};

pub mod buffer;
pub mod filter;
pub mod gradient;
#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;
pub mod resize;

pub use buffer::ImageBuffer;

/// Pixel value types accepted by the algorithms.
pub trait Pixel: Copy + Send + Sync + 'static {
    /// Converts the raw value to `f32` without normalisation.
    fn to_f32(self) -> f32;
}

impl Pixel for u8 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl Pixel for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
}

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> FeatScanResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> FeatScanResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(FeatScanError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
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

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> FeatScanResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(FeatScanError::InvalidDimensions { width, height });
        }

        let out_of_bounds = FeatScanError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(FeatScanError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(FeatScanError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        ImageView::new(data, width, height, self.stride)
    }
}

impl<'a, T: Pixel> ImageView<'a, T> {
    /// Reads `(x, y)` as `f32`, replicating the nearest edge pixel outside
    /// the image.
    #[inline]
    pub fn sample_clamped(&self, x: isize, y: isize) -> f32 {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.data[cy * self.stride + cx].to_f32()
    }

    /// Bilinear sample at a sub-pixel position with replicated borders.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        // Past one pixel outside, every tap lands on the same edge pixel.
        let x = x.clamp(-1.0, self.width as f32);
        let y = y.clamp(-1.0, self.height as f32);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (ix, iy) = (x0 as isize, y0 as isize);
        let a = self.sample_clamped(ix, iy);
        let b = self.sample_clamped(ix + 1, iy);
        let c = self.sample_clamped(ix, iy + 1);
        let d = self.sample_clamped(ix + 1, iy + 1);
        let top = a + (b - a) * fx;
        let bottom = c + (d - c) * fx;
        top + (bottom - top) * fy
    }
}

/// Owned contiguous single-channel image buffer.
#[derive(Clone, Debug)]
pub struct OwnedImage<T = f32> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> OwnedImage<T> {
    /// Wraps a contiguous row-major buffer of exactly `width * height` pixels.
    pub fn new(data: Vec<T>, width: usize, height: usize) -> FeatScanResult<Self> {
        let needed = required_len(width, height, width)?;
        if data.len() < needed {
            return Err(FeatScanError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(FeatScanError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
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

    /// Returns the contiguous pixel data.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

impl OwnedImage<f32> {
    /// Copies any single-channel view into a contiguous `f32` image.
    pub fn from_view<T: Pixel>(view: ImageView<'_, T>) -> FeatScanResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(FeatScanError::BufferTooSmall {
                needed: y * view.stride() + width,
                got: view.as_slice().len(),
            })?;
            data.extend(row.iter().map(|&v| v.to_f32()));
        }
        Self::new(data, width, height)
    }

    /// Creates an image filled with `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> FeatScanResult<Self> {
        let len = required_len(width, height, width)?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies the image into a new buffer padded by replicating edge pixels.
    pub fn padded_replicate(&self, pad_x: usize, pad_y: usize) -> FeatScanResult<Self> {
        let width = self.width + 2 * pad_x;
        let height = self.height + 2 * pad_y;
        let view = self.view();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let sy = y as isize - pad_y as isize;
            for x in 0..width {
                let sx = x as isize - pad_x as isize;
                data.push(view.sample_clamped(sx, sy));
            }
        }
        Self::new(data, width, height)
    }
}

pub(crate) fn required_len(width: usize, height: usize, stride: usize) -> FeatScanResult<usize> {
    if width == 0 || height == 0 {
        return Err(FeatScanError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(FeatScanError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(FeatScanError::InvalidDimensions { width, height })?;
    Ok(needed)
}
