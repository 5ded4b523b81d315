//! Managed pixel buffer implementation.
//!
//! This module provides [`ManagedPixelBuffer`], a concrete implementation of the
//! [`PixelBuffer`] and [`MutablePixelBuffer`] traits that owns its pixel data in a Vec.
//!
//! # Example
//!
//! ```
//! use rfb_pixelbuffer::{ManagedPixelBuffer, PixelFormat, MutablePixelBuffer, PixelBuffer};
//! use rfb_common::Rect;
//!
//! // Create a 100x100 buffer with RGB888 format
//! let mut buffer = ManagedPixelBuffer::new(100, 100, PixelFormat::rgb888());
//!
//! // Fill a rectangle with red
//! let red = buffer.pixel_format().from_rgb888([255, 0, 0, 255]);
//! buffer.fill_rect(Rect::new(10, 10, 50, 50), &red).unwrap();
//!
//! assert_eq!(buffer.dimensions(), (100, 100));
//! ```

use crate::{MutablePixelBuffer, PixelBuffer, PixelFormat};
use anyhow::{anyhow, Result};
use rfb_common::Rect;

/// A pixel buffer that manages its own memory.
///
/// # Memory Layout
///
/// The buffer is stored in row-major order with a stride equal to the width.
/// For a buffer of width W, height H, and bytes-per-pixel B:
///
/// ```text
/// Total size = W * H * B bytes
/// Pixel at (x, y) starts at offset: (y * W + x) * B
/// ```
#[derive(Debug, Clone)]
pub struct ManagedPixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,

    /// Raw pixel data (row-major, no padding)
    data: Vec<u8>,

    /// Stride in **pixels** (always equals width for this implementation)
    stride: usize,
}

impl ManagedPixelBuffer {
    /// Creates a new pixel buffer with the specified dimensions and format.
    ///
    /// The buffer is initialized with all zeros (black for most formats).
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize;
        let bytes_per_pixel = format.bytes_per_pixel() as usize;
        let data = vec![0u8; stride * height as usize * bytes_per_pixel];

        Self {
            width,
            height,
            format,
            data,
            stride,
        }
    }

    /// Returns the stride in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns a reference to the raw pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Converts the whole buffer to tightly packed RGBA8888.
    ///
    /// # Example
    ///
    /// ```
    /// use rfb_pixelbuffer::{ManagedPixelBuffer, PixelFormat};
    ///
    /// let buffer = ManagedPixelBuffer::new(2, 1, PixelFormat::rgb565());
    /// assert_eq!(buffer.to_rgba(), vec![0, 0, 0, 255, 0, 0, 0, 255]);
    /// ```
    pub fn to_rgba(&self) -> Vec<u8> {
        let bpp = self.format.bytes_per_pixel() as usize;
        if bpp == 0 {
            return Vec::new();
        }
        self.data
            .chunks_exact(bpp)
            .flat_map(|pixel| self.format.to_rgb888(pixel))
            .collect()
    }

    /// Byte offset of pixel (x, y).
    pub(crate) fn offset_of(&self, x: usize, y: usize) -> usize {
        (y * self.stride + x) * self.format.bytes_per_pixel() as usize
    }

    /// Validates that a rectangle is within buffer bounds.
    pub(crate) fn validate_rect(&self, rect: Rect) -> Result<()> {
        let fits = rect.x >= 0
            && rect.y >= 0
            && (rect.x as u64 + rect.width as u64) <= self.width as u64
            && (rect.y as u64 + rect.height as u64) <= self.height as u64;
        if !fits {
            return Err(anyhow!(
                "Rectangle out of bounds: {:?} (buffer size: {}x{})",
                rect,
                self.width,
                self.height
            ));
        }
        Ok(())
    }
}

impl PixelBuffer for ManagedPixelBuffer {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel_format(&self) -> &PixelFormat {
        &self.format
    }

    fn get_buffer(&self, rect: Rect, stride: &mut usize) -> Option<&[u8]> {
        if self.validate_rect(rect).is_err() {
            return None;
        }

        *stride = self.stride;
        if rect.is_empty() {
            return Some(&[]);
        }
        let start = self.offset_of(rect.x as usize, rect.y as usize);
        let end = self.offset_of(
            rect.right() as usize,
            rect.bottom() as usize - 1,
        );

        Some(&self.data[start..end])
    }
}

impl MutablePixelBuffer for ManagedPixelBuffer {
    fn fill_rect(&mut self, rect: Rect, pixel: &[u8]) -> Result<()> {
        self.validate_rect(rect)?;

        let bytes_per_pixel = self.format.bytes_per_pixel() as usize;
        if pixel.len() != bytes_per_pixel {
            return Err(anyhow!(
                "Invalid pixel size: got {} bytes, expected {}",
                pixel.len(),
                bytes_per_pixel
            ));
        }

        let row_bytes = rect.width as usize * bytes_per_pixel;
        for y in 0..rect.height as usize {
            let start = self.offset_of(rect.x as usize, rect.y as usize + y);
            for dst in self.data[start..start + row_bytes].chunks_exact_mut(bytes_per_pixel) {
                dst.copy_from_slice(pixel);
            }
        }

        Ok(())
    }

    fn image_rect(&mut self, dest: Rect, pixels: &[u8], stride: usize) -> Result<()> {
        self.validate_rect(dest)?;
        if dest.is_empty() {
            return Ok(());
        }

        let bytes_per_pixel = self.format.bytes_per_pixel() as usize;
        let rect_width_bytes = dest.width as usize * bytes_per_pixel;

        // If stride is 0, source is tightly packed
        let src_stride = if stride == 0 {
            dest.width as usize
        } else {
            stride
        };
        let src_stride_bytes = src_stride * bytes_per_pixel;

        let required_src_bytes = src_stride_bytes * (dest.height as usize - 1) + rect_width_bytes;
        if pixels.len() < required_src_bytes {
            return Err(anyhow!(
                "Insufficient source data: got {} bytes, need at least {}",
                pixels.len(),
                required_src_bytes
            ));
        }

        for y in 0..dest.height as usize {
            let dst_offset = self.offset_of(dest.x as usize, dest.y as usize + y);
            let src_offset = y * src_stride_bytes;

            self.data[dst_offset..dst_offset + rect_width_bytes]
                .copy_from_slice(&pixels[src_offset..src_offset + rect_width_bytes]);
        }

        Ok(())
    }
}
