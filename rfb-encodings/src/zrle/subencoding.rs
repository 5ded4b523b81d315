//! Per-tile sub-encodings.
//!
//! Every tile starts with a one-byte selector:
//!
//! | Selector  | Sub-encoding   |
//! |-----------|----------------|
//! | 0         | Raw            |
//! | 1         | Solid          |
//! | 2-16      | Packed palette |
//! | 17-127    | (unassigned)   |
//! | 128       | Plain RLE      |
//! | 129       | (unassigned)   |
//! | 130-255   | Palette RLE    |
//!
//! Solid tiles go straight to [`DisplaySurface::fill_rect`]. All others are
//! built in the scratch tile and handed to
//! [`DisplaySurface::blit_image`].

use super::rle::decode_run_length;
use super::stream::ByteSource;
use super::tile::{TileBuffer, WirePixel};
use crate::DecodeError;
use rfb_common::Rect;
use rfb_pixelbuffer::DisplaySurface;

/// Largest palette a tile can carry.
const MAX_PALETTE_SIZE: usize = 127;

/// Decoded tile selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubEncoding {
    /// Uncompressed pixels in raster order.
    Raw,
    /// One pixel fills the whole tile.
    Solid,
    /// Palette of 2-16 entries with 1, 2 or 4 bit indices packed per row.
    PackedPalette { size: u8 },
    /// (pixel, run length) pairs.
    PlainRle,
    /// Palette of 2-127 entries followed by index runs.
    PaletteRle { size: u8 },
    /// Selector with no assigned meaning.
    Unassigned(u8),
}

impl From<u8> for SubEncoding {
    fn from(selector: u8) -> Self {
        match selector {
            0 => Self::Raw,
            1 => Self::Solid,
            2..=16 => Self::PackedPalette { size: selector },
            128 => Self::PlainRle,
            130..=255 => Self::PaletteRle {
                size: selector - 128,
            },
            other => Self::Unassigned(other),
        }
    }
}

impl SubEncoding {
    /// Bits per packed palette index for a palette of `size` entries.
    pub fn packed_index_bits(size: u8) -> usize {
        match size {
            0..=2 => 1,
            3..=4 => 2,
            _ => 4,
        }
    }
}

/// A tile's palette, stored as raw wire pixels.
struct Palette {
    entries: [u8; MAX_PALETTE_SIZE * 3],
    size: u8,
    pixel_bytes: usize,
}

impl Palette {
    fn read<S: ByteSource + ?Sized>(
        src: &mut S,
        size: u8,
        pixel_bytes: usize,
    ) -> Result<Self, DecodeError> {
        let len = size as usize * pixel_bytes;
        let raw = src.read_exact(len)?;
        let mut entries = [0u8; MAX_PALETTE_SIZE * 3];
        entries[..len].copy_from_slice(&raw);
        Ok(Self {
            entries,
            size,
            pixel_bytes,
        })
    }

    fn get(&self, index: u8) -> Result<&[u8], DecodeError> {
        if index >= self.size {
            return Err(DecodeError::PaletteIndexOutOfRange {
                index,
                size: self.size,
            });
        }
        let start = index as usize * self.pixel_bytes;
        Ok(&self.entries[start..start + self.pixel_bytes])
    }
}

/// Decode one tile at `rect` (absolute framebuffer coordinates).
pub(crate) fn decode_tile<S: ByteSource + ?Sized>(
    src: &mut S,
    tile: &mut TileBuffer,
    rect: Rect,
    wire: WirePixel,
    display: &mut dyn DisplaySurface,
) -> Result<SubEncoding, DecodeError> {
    let mode = SubEncoding::from(src.read_u8()?);
    tile.start(rect);

    match mode {
        SubEncoding::Solid => {
            let pixel = src.read_exact(wire.bytes)?;
            let rgb = wire.to_rgb(&pixel, &*display);
            display.fill_rect(rect, rgb)?;
            return Ok(mode);
        }
        SubEncoding::Raw => decode_raw(src, tile, wire, &*display)?,
        SubEncoding::PackedPalette { size } => {
            decode_packed_palette(src, tile, size, wire, &*display)?
        }
        SubEncoding::PlainRle => decode_plain_rle(src, tile, wire, &*display)?,
        SubEncoding::PaletteRle { size } => decode_palette_rle(src, tile, size, wire, &*display)?,
        SubEncoding::Unassigned(selector) => {
            return Err(DecodeError::UnknownSubEncoding(selector))
        }
    }

    tile.blit(rect, display)?;
    Ok(mode)
}

fn decode_raw<S: ByteSource + ?Sized>(
    src: &mut S,
    tile: &mut TileBuffer,
    wire: WirePixel,
    display: &dyn DisplaySurface,
) -> Result<(), DecodeError> {
    let data = src.read_exact(tile.area() * wire.bytes)?;
    for (i, pixel) in data.chunks_exact(wire.bytes).enumerate() {
        tile.fill_run(i, 1, pixel, wire, display)?;
    }
    Ok(())
}

fn decode_packed_palette<S: ByteSource + ?Sized>(
    src: &mut S,
    tile: &mut TileBuffer,
    size: u8,
    wire: WirePixel,
    display: &dyn DisplaySurface,
) -> Result<(), DecodeError> {
    let palette = Palette::read(src, size, wire.bytes)?;
    let bits = SubEncoding::packed_index_bits(size);
    let mask = (1u8 << bits) - 1;
    let (width, height) = (tile.width(), tile.height());
    let stride = (width * bits).div_ceil(8);

    for y in 0..height {
        let row = src.read_exact(stride)?;
        for x in 0..width {
            let bit = x * bits;
            let shift = 8 - bits - bit % 8;
            let index = (row[bit / 8] >> shift) & mask;
            tile.fill_run(y * width + x, 1, palette.get(index)?, wire, display)?;
        }
    }
    Ok(())
}

fn decode_plain_rle<S: ByteSource + ?Sized>(
    src: &mut S,
    tile: &mut TileBuffer,
    wire: WirePixel,
    display: &dyn DisplaySurface,
) -> Result<(), DecodeError> {
    let area = tile.area();
    let mut offset = 0;
    while offset < area {
        let pixel = src.read_exact(wire.bytes)?;
        let run = decode_run_length(src)? as usize;
        tile.fill_run(offset, run, &pixel, wire, display)?;
        offset += run;
    }
    Ok(())
}

fn decode_palette_rle<S: ByteSource + ?Sized>(
    src: &mut S,
    tile: &mut TileBuffer,
    size: u8,
    wire: WirePixel,
    display: &dyn DisplaySurface,
) -> Result<(), DecodeError> {
    let palette = Palette::read(src, size, wire.bytes)?;
    let area = tile.area();
    let mut offset = 0;
    while offset < area {
        let index = src.read_u8()?;
        let (slot, run) = if index & 0x80 == 0 {
            (index, 1)
        } else {
            (index & 0x7F, decode_run_length(src)? as usize)
        };
        tile.fill_run(offset, run, palette.get(slot)?, wire, display)?;
        offset += run;
    }
    Ok(())
}
