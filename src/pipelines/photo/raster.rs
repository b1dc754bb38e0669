// SPDX-License-Identifier: GPL-3.0-only

//! Raw RGBA pixel buffers

use crate::backends::camera::types::CameraFrame;
use crate::errors::RasterError;
use image::RgbaImage;

/// Interleaved RGBA, row-major, top-left origin
///
/// `data.len() == width * height * 4` always holds.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        let expected = Self::expected_len(width, height);
        if data.len() != expected {
            return Err(RasterError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Single-color image
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::expected_len(width, height))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Copy a frame into a packed buffer, dropping row padding
    pub fn from_frame(frame: &CameraFrame) -> Result<Self, RasterError> {
        let row_len = frame.width as usize * 4;
        let stride = frame.stride as usize;
        let height = frame.height as usize;

        if stride < row_len || frame.data.len() < stride * height.saturating_sub(1) + row_len {
            return Err(RasterError::BufferSizeMismatch {
                expected: stride * height,
                actual: frame.data.len(),
            });
        }

        let data = if stride == row_len {
            frame.data[..row_len * height].to_vec()
        } else {
            let mut packed = Vec::with_capacity(row_len * height);
            for row in frame.data.chunks(stride).take(height) {
                packed.extend_from_slice(&row[..row_len]);
            }
            packed
        };

        Self::new(frame.width, frame.height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access; length cannot change through a slice
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at (x, y), or `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl From<RgbaImage> for RasterImage {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

impl From<RasterImage> for RgbaImage {
    fn from(raster: RasterImage) -> Self {
        let RasterImage {
            width,
            height,
            data,
        } = raster;
        // Length is guaranteed by the RasterImage invariant
        RgbaImage::from_raw(width, height, data)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }
}
