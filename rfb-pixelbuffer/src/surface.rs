//! Display surface: the sink decoders write pixels into.
//!
//! Decoders produce 24-bit RGB (solid fills) or RGBA8888 tiles (everything
//! else) and never touch the framebuffer's native format. A
//! [`DisplaySurface`] receives those and also owns colour expansion for
//! compact wire pixels, so a front end can override how 8- and 16-bit
//! pixels map to RGB.
//!
//! [`ManagedPixelBuffer`] implements the trait by converting into its own
//! [`PixelFormat`].

use crate::{ManagedPixelBuffer, MutablePixelBuffer, PixelBuffer, PixelFormat};
use anyhow::{anyhow, Result};
use rfb_common::Rect;

/// Destination for decoded pixels.
///
/// The RGBA slice passed to [`blit_image`](Self::blit_image) is only
/// borrowed for the duration of the call; implementations must copy what
/// they need.
pub trait DisplaySurface {
    /// Expand a 2-byte wire pixel to `[R, G, B]`.
    ///
    /// Defaults to little-endian RGB565.
    fn convert_16_to_24(&self, pixel: [u8; 2]) -> [u8; 3] {
        PixelFormat::rgb565().to_rgb(&pixel)
    }

    /// Expand a 1-byte wire pixel to `[R, G, B]` for the negotiated `depth`.
    ///
    /// Defaults to [`PixelFormat::low_color`].
    fn convert_8_to_24(&self, pixel: u8, depth: u8) -> [u8; 3] {
        PixelFormat::low_color(depth).to_rgb(&[pixel])
    }

    /// Fill `rect` with a single colour.
    fn fill_rect(&mut self, rect: Rect, rgb: [u8; 3]) -> Result<()>;

    /// Copy a `rect.width` x `rect.height` block of tightly packed RGBA8888
    /// pixels, starting `offset` bytes into `rgba`, to `rect`.
    fn blit_image(&mut self, rect: Rect, rgba: &[u8], offset: usize) -> Result<()>;
}

impl DisplaySurface for ManagedPixelBuffer {
    fn fill_rect(&mut self, rect: Rect, rgb: [u8; 3]) -> Result<()> {
        let pixel = self.pixel_format().from_rgb888([rgb[0], rgb[1], rgb[2], 255]);
        MutablePixelBuffer::fill_rect(self, rect, &pixel)
    }

    fn blit_image(&mut self, rect: Rect, rgba: &[u8], offset: usize) -> Result<()> {
        let needed = rect.area() as usize * 4;
        let src = rgba
            .get(offset..)
            .and_then(|tail| tail.get(..needed))
            .ok_or_else(|| {
                anyhow!(
                    "RGBA source too short: need {} bytes at offset {}, have {}",
                    needed,
                    offset,
                    rgba.len()
                )
            })?;

        if self.pixel_format().is_rgb888() {
            // RGBA -> BGRX in place of a per-pixel format conversion
            let converted: Vec<u8> = src
                .chunks_exact(4)
                .flat_map(|p| [p[2], p[1], p[0], 0])
                .collect();
            return self.image_rect(rect, &converted, 0);
        }

        let format = *self.pixel_format();
        let converted: Vec<u8> = src
            .chunks_exact(4)
            .flat_map(|p| format.from_rgb888([p[0], p[1], p[2], p[3]]))
            .collect();
        self.image_rect(rect, &converted, 0)
    }
}
