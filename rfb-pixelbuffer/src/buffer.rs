//! Pixel buffer traits.
//!
//! - [`PixelBuffer`]: Read-only access to pixel data
//! - [`MutablePixelBuffer`]: Read-write access with rendering operations
//!
//! # Critical: Stride is in Pixels, Not Bytes!
//!
//! All stride values in this API are measured in **pixels**, not bytes.
//!
//! To calculate byte offsets:
//! ```text
//! byte_offset = (y * stride + x) * bytes_per_pixel
//! ```
//!
//! # Example
//!
//! ```
//! use rfb_pixelbuffer::{ManagedPixelBuffer, MutablePixelBuffer, PixelBuffer, PixelFormat};
//! use rfb_common::Rect;
//!
//! let mut buffer = ManagedPixelBuffer::new(8, 8, PixelFormat::rgb888());
//! let white = buffer.pixel_format().from_rgb888([255, 255, 255, 255]);
//! buffer.fill_rect(Rect::new(2, 2, 2, 2), &white).unwrap();
//!
//! let mut stride = 0;
//! let pixels = buffer.get_buffer(Rect::new(2, 2, 1, 1), &mut stride).unwrap();
//! assert_eq!(stride, 8);
//! assert_eq!(&pixels[..4], &white[..]);
//! ```

use crate::PixelFormat;
use anyhow::Result;
use rfb_common::Rect;

/// Read-only pixel buffer access.
///
/// # Stride Convention
///
/// All stride values are in **pixels**, not bytes. See module documentation for details.
pub trait PixelBuffer {
    /// Returns the dimensions of the pixel buffer as (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Returns a reference to the pixel format used by this buffer.
    fn pixel_format(&self) -> &PixelFormat;

    /// Gets read-only access to a rectangular region of pixel data.
    ///
    /// # Parameters
    ///
    /// - `rect`: The rectangular region to access
    /// - `stride`: Output parameter receiving the stride in **pixels** (not bytes!)
    ///
    /// # Returns
    ///
    /// - `Some(&[u8])`: Slice starting at the rectangle's top-left pixel and
    ///   ending after its bottom-right pixel
    /// - `None`: If the rectangle is out of bounds
    ///
    /// The returned slice spans whole buffer rows in between, so use the
    /// stride to step from one row of the rectangle to the next.
    fn get_buffer(&self, rect: Rect, stride: &mut usize) -> Option<&[u8]>;
}

/// Mutable pixel buffer with rendering operations.
///
/// Pixel values passed to these methods are already in the buffer's own
/// [`PixelFormat`]; use [`PixelFormat::from_rgb888`] to produce them.
pub trait MutablePixelBuffer: PixelBuffer {
    /// Fills a rectangle with a solid color.
    ///
    /// # Errors
    ///
    /// Fails if the rectangle is out of bounds or `pixel` is not exactly
    /// `bytes_per_pixel()` long.
    fn fill_rect(&mut self, rect: Rect, pixel: &[u8]) -> Result<()>;

    /// Copies image data into a rectangle.
    ///
    /// # Parameters
    ///
    /// - `dest`: Destination rectangle
    /// - `pixels`: Source pixel data (must match pixel format)
    /// - `stride`: Source stride in **pixels** (0 = tightly packed)
    ///
    /// # Errors
    ///
    /// Fails if the rectangle is out of bounds or `pixels` is too short.
    fn image_rect(&mut self, dest: Rect, pixels: &[u8], stride: usize) -> Result<()>;
}
