//! Capture file format.
//!
//! A capture is the server-to-client half of a ZRLE session with the
//! handshake stripped down to what decoding needs:
//!
//! ```text
//! +----------------+----------+----------+--------------------+
//! | "RFBZRLE\0" x8 | width u16 | height u16 | PixelFormat (16) |
//! +----------------+----------+----------+--------------------+
//! then, repeated until end of file:
//! +-------------------------+---------------------------------+
//! | Rectangle header (12)   | ZRLE data: u32 length + zlib    |
//! +-------------------------+---------------------------------+
//! ```
//!
//! All integers are big-endian, as on the wire. Rectangle data is exactly
//! what the server sent, so every rectangle shares one zlib stream.
//!
//! The decoder takes 3-byte compressed pixels as `[R, G, B]`. For 24 and
//! 32 bpp captures that means red in the low byte for little-endian
//! formats (shifts 0/8/16) and in the high byte for big-endian ones
//! (shifts 16/8/0); see [`CaptureHeader::has_rgb_byte_order`].

use crate::errors::ReplayError;
use rfb_protocol::{PixelFormat, ReadQueue, Rectangle};

/// Magic bytes at the start of every capture.
pub const MAGIC: &[u8; 8] = b"RFBZRLE\0";

/// Size of [`CaptureHeader`] on disk.
pub const HEADER_SIZE: usize = MAGIC.len() + 4 + PixelFormat::WIRE_SIZE;

/// Framebuffer geometry and server pixel format for a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureHeader {
    pub width: u16,
    pub height: u16,
    pub pixel_format: PixelFormat,
}

impl CaptureHeader {
    /// Read the header from a queue.
    ///
    /// Returns `Ok(None)` without consuming anything until the whole header
    /// is buffered.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::BadMagic`] if the magic does not match, or an
    /// I/O error if the pixel format is malformed.
    pub fn read_from<Q: ReadQueue + ?Sized>(queue: &mut Q) -> Result<Option<Self>, ReplayError> {
        if queue.must_wait(HEADER_SIZE) {
            return Ok(None);
        }

        let magic = queue.read_bytes(MAGIC.len())?;
        if magic[..] != MAGIC[..] {
            return Err(ReplayError::BadMagic);
        }

        let width = queue.read_u16()?;
        let height = queue.read_u16()?;
        let pixel_format = PixelFormat::read_from(queue)?
            .ok_or_else(|| ReplayError::Truncated("pixel format".to_string()))?;

        Ok(Some(Self {
            width,
            height,
            pixel_format,
        }))
    }

    /// True if compressed pixels in this format arrive as `[R, G, B]`.
    /// Formats of 16 bpp or less are converted by value and always pass.
    pub fn has_rgb_byte_order(&self) -> bool {
        let pf = &self.pixel_format;
        if pf.bits_per_pixel <= 16 {
            return true;
        }
        let shifts = (pf.red_shift, pf.green_shift, pf.blue_shift);
        if pf.big_endian == 0 {
            shifts == (0, 8, 16)
        } else {
            shifts == (16, 8, 0)
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..8].copy_from_slice(MAGIC);
        out[8..10].copy_from_slice(&self.width.to_be_bytes());
        out[10..12].copy_from_slice(&self.height.to_be_bytes());
        out[12..].copy_from_slice(&self.pixel_format.to_bytes());
        out
    }
}

/// Builds capture files in memory.
///
/// ```
/// use rfb_protocol::{PixelFormat, Rectangle};
/// use rfb_replay::capture::{CaptureHeader, CaptureWriter, HEADER_SIZE};
///
/// let header = CaptureHeader {
///     width: 4,
///     height: 4,
///     pixel_format: PixelFormat {
///         bits_per_pixel: 32, depth: 24, big_endian: 0, true_color: 1,
///         red_max: 255, green_max: 255, blue_max: 255,
///         red_shift: 0, green_shift: 8, blue_shift: 16,
///     },
/// };
/// let mut writer = CaptureWriter::new(&header);
/// writer.rect(&Rectangle { x: 0, y: 0, width: 4, height: 4, encoding: 16 }, &[0, 0, 0, 0]);
/// assert_eq!(writer.finish().len(), HEADER_SIZE + Rectangle::WIRE_SIZE + 4);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureWriter {
    data: Vec<u8>,
}

impl CaptureWriter {
    pub fn new(header: &CaptureHeader) -> Self {
        Self {
            data: header.to_bytes().to_vec(),
        }
    }

    /// Append a rectangle header followed by its encoded data.
    pub fn rect(&mut self, rect: &Rectangle, encoded: &[u8]) -> &mut Self {
        self.data.extend_from_slice(&rect.to_bytes());
        self.data.extend_from_slice(encoded);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}
