//! Reference ZRLE encoder for round-trip tests.
//!
//! Produces the server side of the protocol: one zlib stream per
//! connection, sync-flushed after every rectangle, with every tile encoded
//! using a caller-chosen sub-encoding.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use rfb_encodings::DecodeStatus;
use rfb_protocol::{Rectangle, RecvQueue};
use std::io::Write;

pub const TILE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    Raw,
    Solid,
    PackedPalette,
    PlainRle,
    PaletteRle,
}

impl TileMode {
    pub const ALL: [TileMode; 5] = [
        TileMode::Raw,
        TileMode::Solid,
        TileMode::PackedPalette,
        TileMode::PlainRle,
        TileMode::PaletteRle,
    ];
}

/// A rectangle of wire pixels, `pixel_bytes` each, row-major.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixel_bytes: usize,
    pub data: Vec<u8>,
}

impl Image {
    /// Build an image by evaluating `pixel(x, y)` for every position.
    pub fn from_fn(
        width: usize,
        height: usize,
        pixel_bytes: usize,
        pixel: impl Fn(usize, usize) -> Vec<u8>,
    ) -> Self {
        let mut data = Vec::with_capacity(width * height * pixel_bytes);
        for y in 0..height {
            for x in 0..width {
                let p = pixel(x, y);
                assert_eq!(p.len(), pixel_bytes);
                data.extend(p);
            }
        }
        Self {
            width,
            height,
            pixel_bytes,
            data,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let start = (y * self.width + x) * self.pixel_bytes;
        &self.data[start..start + self.pixel_bytes]
    }
}

pub struct ZrleEncoder {
    zlib: ZlibEncoder<Vec<u8>>,
}

impl Default for ZrleEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZrleEncoder {
    pub fn new() -> Self {
        Self {
            zlib: ZlibEncoder::new(Vec::new(), Compression::default()),
        }
    }

    /// Length-prefixed ZRLE data for `image`, every tile in `mode`.
    pub fn encode_rect(&mut self, image: &Image, mode: TileMode) -> Vec<u8> {
        let mut raw = Vec::new();
        for ty in (0..image.height).step_by(TILE) {
            for tx in (0..image.width).step_by(TILE) {
                let tw = TILE.min(image.width - tx);
                let th = TILE.min(image.height - ty);
                let pixels: Vec<&[u8]> = (0..th)
                    .flat_map(|y| (0..tw).map(move |x| (x, y)))
                    .map(|(x, y)| image.pixel(tx + x, ty + y))
                    .collect();
                encode_tile(&mut raw, &pixels, tw, mode);
            }
        }
        self.compress(&raw)
    }

    /// Length-prefixed ZRLE data for already-built tile bytes.
    pub fn compress(&mut self, tiles: &[u8]) -> Vec<u8> {
        self.zlib.write_all(tiles).unwrap();
        self.zlib.flush().unwrap();
        let compressed = std::mem::take(self.zlib.get_mut());
        let mut out = (compressed.len() as u32).to_be_bytes().to_vec();
        out.extend(compressed);
        out
    }
}

pub fn encode_run_length(out: &mut Vec<u8>, run: usize) {
    let mut rest = run - 1;
    while rest >= 255 {
        out.push(255);
        rest -= 255;
    }
    out.push(rest as u8);
}

fn palette_of<'a>(pixels: &[&'a [u8]]) -> Vec<&'a [u8]> {
    let mut palette: Vec<&[u8]> = Vec::new();
    for &p in pixels {
        if !palette.contains(&p) {
            palette.push(p);
        }
    }
    palette
}

fn runs<'a>(pixels: &[&'a [u8]]) -> Vec<(&'a [u8], usize)> {
    let mut runs: Vec<(&[u8], usize)> = Vec::new();
    for &p in pixels {
        if let Some((last, len)) = runs.last_mut() {
            if *last == p {
                *len += 1;
                continue;
            }
        }
        runs.push((p, 1));
    }
    runs
}

fn encode_tile(out: &mut Vec<u8>, pixels: &[&[u8]], width: usize, mode: TileMode) {
    match mode {
        TileMode::Raw => {
            out.push(0);
            for p in pixels {
                out.extend_from_slice(p);
            }
        }
        TileMode::Solid => {
            out.push(1);
            out.extend_from_slice(pixels[0]);
        }
        TileMode::PackedPalette => {
            let palette = palette_of(pixels);
            assert!(
                (2..=16).contains(&palette.len()),
                "packed palette needs 2-16 colours, tile has {}",
                palette.len()
            );
            out.push(palette.len() as u8);
            for p in &palette {
                out.extend_from_slice(p);
            }
            let bits = match palette.len() {
                2 => 1,
                3..=4 => 2,
                _ => 4,
            };
            for row in pixels.chunks(width) {
                let mut packed = vec![0u8; (width * bits).div_ceil(8)];
                for (x, p) in row.iter().enumerate() {
                    let index = palette.iter().position(|c| c == p).unwrap() as u8;
                    let bit = x * bits;
                    packed[bit / 8] |= index << (8 - bits - bit % 8);
                }
                out.extend(packed);
            }
        }
        TileMode::PlainRle => {
            out.push(128);
            for (p, len) in runs(pixels) {
                out.extend_from_slice(p);
                encode_run_length(out, len);
            }
        }
        TileMode::PaletteRle => {
            let palette = palette_of(pixels);
            assert!(
                (2..=127).contains(&palette.len()),
                "palette RLE needs 2-127 colours, tile has {}",
                palette.len()
            );
            out.push(128 + palette.len() as u8);
            for p in &palette {
                out.extend_from_slice(p);
            }
            for (p, len) in runs(pixels) {
                let index = palette.iter().position(|c| *c == p).unwrap() as u8;
                if len == 1 {
                    out.push(index);
                } else {
                    out.push(index | 0x80);
                    encode_run_length(out, len);
                }
            }
        }
    }
}

/// Rectangle header for a ZRLE rectangle.
pub fn zrle_rect(x: u16, y: u16, image: &Image) -> Rectangle {
    Rectangle {
        x,
        y,
        width: image.width as u16,
        height: image.height as u16,
        encoding: rfb_encodings::ENCODING_ZRLE,
    }
}

/// Push `data` into `queue` in pieces of `step` bytes, calling `decode`
/// after each piece until it reports completion. Returns how many calls
/// reported `NeedData`.
pub fn trickle(
    queue: &mut RecvQueue,
    data: &[u8],
    step: usize,
    mut decode: impl FnMut(&mut RecvQueue) -> DecodeStatus,
) -> usize {
    let mut waits = 0;
    for piece in data.chunks(step) {
        queue.push(piece);
        match decode(queue) {
            DecodeStatus::NeedData => waits += 1,
            DecodeStatus::Complete => return waits,
        }
    }
    panic!("rectangle did not complete after {} bytes", data.len());
}
