//! Tile geometry and the RGBA scratch tile.

use crate::DecodeError;
use rfb_common::Rect;
use rfb_pixelbuffer::DisplaySurface;

/// ZRLE tile edge length in pixels.
pub const TILE_SIZE: u32 = 64;

const TILE_PIXELS: usize = (TILE_SIZE * TILE_SIZE) as usize;

/// How pixels are laid out in the decompressed stream.
///
/// ZRLE sends at most 3 bytes per pixel ("CPIXEL"); 32 bpp formats drop
/// their padding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WirePixel {
    pub(crate) bytes: usize,
    pub(crate) depth: u8,
}

impl WirePixel {
    pub(crate) fn new(bits_per_pixel: u8, depth: u8) -> Result<Self, DecodeError> {
        let bytes = ((u16::from(bits_per_pixel) + 4) / 8).min(3) as usize;
        if bytes == 0 {
            return Err(DecodeError::UnsupportedPixelFormat { bits_per_pixel });
        }
        Ok(Self { bytes, depth })
    }

    /// Expand one wire pixel (`self.bytes` long) to `[R, G, B]`.
    pub(crate) fn to_rgb(self, raw: &[u8], display: &dyn DisplaySurface) -> [u8; 3] {
        match raw {
            [p] => display.convert_8_to_24(*p, self.depth),
            [lo, hi] => display.convert_16_to_24([*lo, *hi]),
            [r, g, b, ..] => [*r, *g, *b],
            [] => [0, 0, 0],
        }
    }
}

/// Fixed 64x64 RGBA8888 buffer reused for every tile.
pub(crate) struct TileBuffer {
    pixels: Box<[u8]>,
    width: usize,
    height: usize,
}

impl TileBuffer {
    pub(crate) fn new() -> Self {
        Self {
            pixels: vec![0u8; TILE_PIXELS * 4].into_boxed_slice(),
            width: 0,
            height: 0,
        }
    }

    /// Size the buffer for `tile`. Previous contents are not cleared.
    pub(crate) fn start(&mut self, tile: Rect) {
        self.width = (tile.width as usize).min(TILE_SIZE as usize);
        self.height = (tile.height as usize).min(TILE_SIZE as usize);
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn area(&self) -> usize {
        self.width * self.height
    }

    /// Write `run` copies of the wire pixel `color` starting at pixel
    /// `offset` (row-major within the tile).
    pub(crate) fn fill_run(
        &mut self,
        offset: usize,
        run: usize,
        color: &[u8],
        wire: WirePixel,
        display: &dyn DisplaySurface,
    ) -> Result<(), DecodeError> {
        let remaining = self.area().saturating_sub(offset);
        if run > remaining {
            return Err(DecodeError::RunOverflow { run, remaining });
        }

        let [r, g, b] = wire.to_rgb(color, display);
        for px in self.pixels[offset * 4..(offset + run) * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
        Ok(())
    }

    /// Hand the filled tile to the display at `tile`.
    pub(crate) fn blit(&self, tile: Rect, display: &mut dyn DisplaySurface) -> Result<(), DecodeError> {
        display.blit_image(tile, &self.pixels[..self.area() * 4], 0)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn rgba(&self) -> &[u8] {
        &self.pixels[..self.area() * 4]
    }
}

/// Row-major iterator over the tiles covering a rectangle.
///
/// Tiles are 64x64 except in the last column and row, which are clipped to
/// the rectangle. An empty rectangle has no tiles.
#[derive(Debug, Clone)]
pub(crate) struct TileGrid {
    area: Rect,
    tx: u32,
    ty: u32,
}

impl TileGrid {
    pub(crate) fn new(area: Rect) -> Self {
        Self { area, tx: 0, ty: 0 }
    }
}

impl Iterator for TileGrid {
    type Item = Rect;

    fn next(&mut self) -> Option<Rect> {
        if self.area.width == 0 || self.ty >= self.area.height {
            return None;
        }

        let tile = Rect::new(
            self.area.x + self.tx as i32,
            self.area.y + self.ty as i32,
            (self.area.width - self.tx).min(TILE_SIZE),
            (self.area.height - self.ty).min(TILE_SIZE),
        );
        debug_assert!(self.area.contains_rect(&tile));

        self.tx = self.tx.saturating_add(TILE_SIZE);
        if self.tx >= self.area.width {
            self.tx = 0;
            self.ty = self.ty.saturating_add(TILE_SIZE);
        }
        Some(tile)
    }
}
