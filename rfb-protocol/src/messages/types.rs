//! Core RFB wire types.
//!
//! This module defines the fixed-size structures the decoders need:
//! - [`PixelFormat`] - Describes pixel format (bit depths, color channels, endianness)
//! - [`Rectangle`] - Rectangle header with encoding type
//! - Encoding constants
//!
//! Both types are read from a [`ReadQueue`] without blocking: `read_from`
//! returns `Ok(None)` and consumes nothing until the whole structure has
//! been buffered.

use crate::io::ReadQueue;

/// RFB pixel format specification.
///
/// Describes how pixels are encoded in the framebuffer, including:
/// - Bits per pixel and color depth
/// - RGB channel sizes and bit positions
/// - Byte order (big/little endian)
///
/// # Wire Format
///
/// PixelFormat is 16 bytes on the wire:
/// - 1 byte: bits_per_pixel
/// - 1 byte: depth
/// - 1 byte: big_endian (0 or 1)
/// - 1 byte: true_color (0 or 1)
/// - 2 bytes: red_max
/// - 2 bytes: green_max
/// - 2 bytes: blue_max
/// - 1 byte: red_shift
/// - 1 byte: green_shift
/// - 1 byte: blue_shift
/// - 3 bytes: padding (must be zero)
///
/// # Examples
///
/// ```
/// use rfb_protocol::messages::types::PixelFormat;
///
/// // Standard 32-bit RGB format
/// let pf = PixelFormat {
///     bits_per_pixel: 32,
///     depth: 24,
///     big_endian: 0,
///     true_color: 1,
///     red_max: 255,
///     green_max: 255,
///     blue_max: 255,
///     red_shift: 16,
///     green_shift: 8,
///     blue_shift: 0,
/// };
///
/// assert_eq!(pf.bytes_per_pixel(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: u8, // Boolean: must be 0 or 1
    pub true_color: u8, // Boolean: must be 0 or 1
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl PixelFormat {
    /// Size of a PixelFormat on the wire.
    pub const WIRE_SIZE: usize = 16;

    /// Calculate bytes per pixel (1, 2, 3, or 4).
    pub fn bytes_per_pixel(&self) -> u8 {
        self.bits_per_pixel.div_ceil(8)
    }

    /// Read a PixelFormat from a receive queue.
    ///
    /// Returns `Ok(None)` without consuming anything if fewer than
    /// [`WIRE_SIZE`](Self::WIRE_SIZE) bytes are buffered.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Boolean fields (big_endian, true_color) are not 0 or 1
    /// - Padding bytes are not zero
    pub fn read_from<Q: ReadQueue + ?Sized>(queue: &mut Q) -> std::io::Result<Option<Self>> {
        if queue.must_wait(Self::WIRE_SIZE) {
            return Ok(None);
        }

        let bits_per_pixel = queue.read_u8()?;
        let depth = queue.read_u8()?;
        let big_endian = queue.read_u8()?;
        let true_color = queue.read_u8()?;

        // Validate booleans strictly
        if big_endian > 1 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("big_endian must be 0 or 1, got {}", big_endian),
            ));
        }
        if true_color > 1 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("true_color must be 0 or 1, got {}", true_color),
            ));
        }

        let red_max = queue.read_u16()?;
        let green_max = queue.read_u16()?;
        let blue_max = queue.read_u16()?;
        let red_shift = queue.read_u8()?;
        let green_shift = queue.read_u8()?;
        let blue_shift = queue.read_u8()?;

        let padding = queue.read_bytes(3)?;
        if padding[..] != [0, 0, 0] {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("padding must be zero, got {:?}", &padding[..]),
            ));
        }

        Ok(Some(Self {
            bits_per_pixel,
            depth,
            big_endian,
            true_color,
            red_max,
            green_max,
            blue_max,
            red_shift,
            green_shift,
            blue_shift,
        }))
    }

    /// Serialize to the 16-byte wire representation.
    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0] = self.bits_per_pixel;
        out[1] = self.depth;
        out[2] = self.big_endian;
        out[3] = self.true_color;
        out[4..6].copy_from_slice(&self.red_max.to_be_bytes());
        out[6..8].copy_from_slice(&self.green_max.to_be_bytes());
        out[8..10].copy_from_slice(&self.blue_max.to_be_bytes());
        out[10] = self.red_shift;
        out[11] = self.green_shift;
        out[12] = self.blue_shift;
        out
    }
}

/// Rectangle header for framebuffer updates.
///
/// Describes a rectangular region of the screen along with the encoding
/// type used for its pixel data.
///
/// # Wire Format
///
/// Rectangle header is 12 bytes:
/// - 2 bytes: x position
/// - 2 bytes: y position
/// - 2 bytes: width
/// - 2 bytes: height
/// - 4 bytes: encoding type (signed i32)
///
/// The encoding-specific payload that follows is consumed by a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub encoding: i32,
}

impl Rectangle {
    /// Size of a rectangle header on the wire.
    pub const WIRE_SIZE: usize = 12;

    /// Read a Rectangle header from a receive queue.
    ///
    /// Returns `Ok(None)` without consuming anything if the full 12-byte
    /// header has not arrived yet.
    pub fn read_from<Q: ReadQueue + ?Sized>(queue: &mut Q) -> std::io::Result<Option<Self>> {
        if queue.must_wait(Self::WIRE_SIZE) {
            return Ok(None);
        }
        Ok(Some(Self {
            x: queue.read_u16()?,
            y: queue.read_u16()?,
            width: queue.read_u16()?,
            height: queue.read_u16()?,
            encoding: queue.read_i32()?,
        }))
    }

    /// Serialize to the 12-byte wire representation.
    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0..2].copy_from_slice(&self.x.to_be_bytes());
        out[2..4].copy_from_slice(&self.y.to_be_bytes());
        out[4..6].copy_from_slice(&self.width.to_be_bytes());
        out[6..8].copy_from_slice(&self.height.to_be_bytes());
        out[8..12].copy_from_slice(&self.encoding.to_be_bytes());
        out
    }

    /// Number of pixels covered by this rectangle.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

//
// Encoding type constants
//

/// Raw encoding - uncompressed pixel data.
pub const ENCODING_RAW: i32 = 0;

/// ZRLE (Zlib Run-Length Encoding).
pub const ENCODING_ZRLE: i32 = 16;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RecvQueue;

    fn rgb888() -> PixelFormat {
        PixelFormat {
            bits_per_pixel: 32,
            depth: 24,
            big_endian: 0,
            true_color: 1,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    #[test]
    fn test_pixelformat_bytes_per_pixel() {
        let mut pf = rgb888();
        assert_eq!(pf.bytes_per_pixel(), 4);

        pf.bits_per_pixel = 16;
        assert_eq!(pf.bytes_per_pixel(), 2);

        pf.bits_per_pixel = 8;
        assert_eq!(pf.bytes_per_pixel(), 1);
    }

    #[test]
    fn test_pixelformat_wire_layout() {
        let bytes = rgb888().to_bytes();
        assert_eq!(
            bytes,
            [32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0]
        );

        let mut queue = RecvQueue::new();
        queue.push(&bytes);
        assert_eq!(PixelFormat::read_from(&mut queue).unwrap(), Some(rgb888()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pixelformat_waits_for_full_struct() {
        let bytes = rgb888().to_bytes();
        let mut queue = RecvQueue::new();
        queue.push(&bytes[..15]);

        assert_eq!(PixelFormat::read_from(&mut queue).unwrap(), None);
        assert_eq!(queue.available(), 15);
    }

    #[test]
    fn test_pixelformat_invalid_boolean() {
        // big_endian = 2 (invalid)
        let data = [
            32, 24, 2, 1, // bits_per_pixel, depth, big_endian (INVALID), true_color
            0, 255, 0, 255, 0, 255, // red_max, green_max, blue_max
            16, 8, 0, // red_shift, green_shift, blue_shift
            0, 0, 0, // padding
        ];
        let mut queue = RecvQueue::new();
        queue.push(&data);
        let err = PixelFormat::read_from(&mut queue).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_pixelformat_invalid_padding() {
        let data = [
            32, 24, 0, 1, // bits_per_pixel, depth, big_endian, true_color
            0, 255, 0, 255, 0, 255, // red_max, green_max, blue_max
            16, 8, 0, // red_shift, green_shift, blue_shift
            1, 0, 0, // padding (INVALID - first byte non-zero)
        ];
        let mut queue = RecvQueue::new();
        queue.push(&data);
        assert!(PixelFormat::read_from(&mut queue).is_err());
    }

    #[test]
    fn test_rectangle_read() {
        let mut queue = RecvQueue::new();
        queue.push(&[0, 100, 0, 200, 0x02, 0x80, 0x01, 0xE0, 0, 0, 0, 16]);

        let rect = Rectangle::read_from(&mut queue).unwrap().unwrap();
        assert_eq!(
            rect,
            Rectangle {
                x: 100,
                y: 200,
                width: 640,
                height: 480,
                encoding: ENCODING_ZRLE,
            }
        );
        assert_eq!(rect.area(), 640 * 480);
    }

    #[test]
    fn test_rectangle_negative_encoding() {
        let rect = Rectangle {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            encoding: -239,
        };
        let mut queue = RecvQueue::new();
        queue.push(&rect.to_bytes());
        assert_eq!(Rectangle::read_from(&mut queue).unwrap(), Some(rect));
    }
}
