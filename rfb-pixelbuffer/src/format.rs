//! Client-side pixel format descriptions and conversions.
//!
//! [`PixelFormat`] describes how a pixel value is laid out in bytes: storage
//! width, byte order, and the size and position of each colour channel.
//! The ZRLE decoder uses it to expand compact wire pixels (1 or 2 bytes) to
//! 24-bit RGB before they reach the framebuffer.
//!
//! Only **true color** formats are modelled; colour-map formats are not.
//!
//! # Channel Extraction and Scaling
//!
//! To extract a color component from a pixel value:
//! 1. Shift right by the channel's shift value
//! 2. Mask with the channel's max value
//! 3. Scale to 8-bit: `(component * 255) / channel_max`
//!
//! # Example
//!
//! ```
//! use rfb_pixelbuffer::PixelFormat;
//!
//! // RGB565, little-endian: pure red is 0xF800 => [0x00, 0xF8]
//! let pf = PixelFormat::rgb565();
//! assert_eq!(pf.to_rgb(&[0x00, 0xF8]), [0xFF, 0x00, 0x00]);
//!
//! // BGR233 (8 bpp): blue occupies the top two bits
//! let pf = PixelFormat::low_color(8);
//! assert_eq!(pf.to_rgb(&[0xC0]), [0x00, 0x00, 0xFF]);
//! ```

/// Describes a pixel format and provides conversions to/from RGB888.
///
/// # Standard Formats
///
/// - [`PixelFormat::rgb888()`] - 32-bit little-endian, 8 bits per channel
/// - [`PixelFormat::rgb565()`] - 16-bit little-endian, 5/6/5 bits
/// - [`PixelFormat::low_color()`] - 8-bit BGR233/BGR222/BGR111 by depth
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct PixelFormat {
    /// Bits used per pixel (bpp), e.g., 32 for RGB888 in 32-bit storage.
    pub bits_per_pixel: u8,

    /// Actual color depth (sum of significant bits), e.g., 24 for RGB888.
    pub depth: u8,

    /// Byte order for multi-byte pixels (`true` = big endian, `false` = little endian).
    pub big_endian: bool,

    /// True color (direct color) vs. color map (`false`).
    pub true_color: bool,

    /// Maximum valid red component value in this format (e.g., 255 for 8-bit red).
    pub red_max: u16,

    /// Maximum valid green component value in this format.
    pub green_max: u16,

    /// Maximum valid blue component value in this format.
    pub blue_max: u16,

    /// Bit shift for the least significant bit of the red component.
    pub red_shift: u8,

    /// Bit shift for the least significant bit of the green component.
    pub green_shift: u8,

    /// Bit shift for the least significant bit of the blue component.
    pub blue_shift: u8,
}

impl PixelFormat {
    /// Returns bytes-per-pixel (storage width), rounded up to the nearest byte.
    pub fn bytes_per_pixel(&self) -> u8 {
        self.bits_per_pixel.div_ceil(8)
    }

    /// Returns a standard little-endian 32bpp RGB888 pixel format.
    ///
    /// In memory, a pixel with R=0xAA, G=0xBB, B=0xCC is stored as
    /// `[0xCC, 0xBB, 0xAA, 0x00]`.
    pub fn rgb888() -> Self {
        Self::direct(32, 24, (255, 255, 255), (16, 8, 0))
    }

    /// Returns a little-endian 16bpp RGB565 pixel format.
    ///
    /// Red occupies bits 11-15, green bits 5-10 and blue bits 0-4.
    pub fn rgb565() -> Self {
        Self::direct(16, 16, (31, 63, 31), (11, 5, 0))
    }

    /// Returns the 8bpp low-colour format used for the given depth.
    ///
    /// | depth | layout | channel bits (R/G/B) |
    /// |-------|--------|----------------------|
    /// | >= 8  | BGR233 | 3 / 3 / 2            |
    /// | 4..=7 | BGR222 | 2 / 2 / 2            |
    /// | <= 3  | BGR111 | 1 / 1 / 1            |
    ///
    /// Red always sits in the low bits.
    ///
    /// # Example
    ///
    /// ```
    /// use rfb_pixelbuffer::PixelFormat;
    ///
    /// let pf = PixelFormat::low_color(6);
    /// assert_eq!((pf.red_max, pf.green_max, pf.blue_max), (3, 3, 3));
    /// assert_eq!((pf.red_shift, pf.green_shift, pf.blue_shift), (0, 2, 4));
    /// ```
    pub fn low_color(depth: u8) -> Self {
        match depth {
            8..=u8::MAX => Self::direct(8, 8, (7, 7, 3), (0, 3, 6)),
            4..=7 => Self::direct(8, 6, (3, 3, 3), (0, 2, 4)),
            _ => Self::direct(8, 3, (1, 1, 1), (0, 1, 2)),
        }
    }

    fn direct(bits_per_pixel: u8, depth: u8, max: (u16, u16, u16), shift: (u8, u8, u8)) -> Self {
        Self {
            bits_per_pixel,
            depth,
            big_endian: false,
            true_color: true,
            red_max: max.0,
            green_max: max.1,
            blue_max: max.2,
            red_shift: shift.0,
            green_shift: shift.1,
            blue_shift: shift.2,
        }
    }

    /// Converts a pixel from this format to `[R, G, B]`.
    ///
    /// At most `bytes_per_pixel()` leading bytes of `pixel` are used. A
    /// channel whose max is zero always converts to 0.
    ///
    /// # Example
    ///
    /// ```
    /// use rfb_pixelbuffer::PixelFormat;
    ///
    /// let pf = PixelFormat::rgb888();
    /// assert_eq!(pf.to_rgb(&[0x33, 0x22, 0x11, 0x00]), [0x11, 0x22, 0x33]);
    /// ```
    pub fn to_rgb(&self, pixel: &[u8]) -> [u8; 3] {
        let bpp = self.bytes_per_pixel() as usize;
        let bytes = &pixel[..bpp.min(pixel.len())];

        // Assemble pixel value from bytes according to endianness
        let value = if self.big_endian {
            bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
        } else {
            bytes
                .iter()
                .enumerate()
                .fold(0u32, |acc, (i, &b)| acc | (b as u32) << (i * 8))
        };

        [
            scale_channel(value, self.red_shift, self.red_max),
            scale_channel(value, self.green_shift, self.green_max),
            scale_channel(value, self.blue_shift, self.blue_max),
        ]
    }

    /// Converts a pixel from this format to RGBA8888 `[R, G, B, 255]`.
    pub fn to_rgb888(&self, pixel: &[u8]) -> [u8; 4] {
        let [r, g, b] = self.to_rgb(pixel);
        [r, g, b, 255]
    }

    /// Converts an RGBA8888 pixel `[R, G, B, A]` to this format.
    ///
    /// The alpha channel is ignored (only RGB channels are encoded).
    ///
    /// # Example
    ///
    /// ```
    /// use rfb_pixelbuffer::PixelFormat;
    ///
    /// let pf = PixelFormat::rgb565();
    /// let raw = pf.from_rgb888([0xFF, 0x00, 0x00, 0xFF]);
    /// assert_eq!(raw, vec![0x00, 0xF8]);
    /// ```
    pub fn from_rgb888(&self, rgb: [u8; 4]) -> Vec<u8> {
        // Scale from 8-bit to format range
        let r = (rgb[0] as u32 * self.red_max as u32) / 255;
        let g = (rgb[1] as u32 * self.green_max as u32) / 255;
        let b = (rgb[2] as u32 * self.blue_max as u32) / 255;

        let value = [(r, self.red_shift), (g, self.green_shift), (b, self.blue_shift)]
            .iter()
            .fold(0u32, |acc, &(c, shift)| acc | c.checked_shl(shift as u32).unwrap_or(0));

        let bpp = self.bytes_per_pixel() as usize;
        let le = value.to_le_bytes();
        let mut result = le[..bpp.min(4)].to_vec();
        if self.big_endian {
            result.reverse();
        }
        result
    }

    /// Check if this pixel format is RGB888 (32bpp, 24-bit depth, little-endian).
    pub fn is_rgb888(&self) -> bool {
        *self == Self::rgb888()
    }
}

fn scale_channel(value: u32, shift: u8, max: u16) -> u8 {
    if max == 0 {
        return 0;
    }
    let component = value.checked_shr(shift as u32).unwrap_or(0) & max as u32;
    ((component * 255) / max as u32) as u8
}

/// Convert from the wire PixelFormat to the client-side PixelFormat.
impl From<rfb_protocol::messages::types::PixelFormat> for PixelFormat {
    fn from(pf: rfb_protocol::messages::types::PixelFormat) -> Self {
        Self {
            bits_per_pixel: pf.bits_per_pixel,
            depth: pf.depth,
            big_endian: pf.big_endian != 0,
            true_color: pf.true_color != 0,
            red_max: pf.red_max,
            green_max: pf.green_max,
            blue_max: pf.blue_max,
            red_shift: pf.red_shift,
            green_shift: pf.green_shift,
            blue_shift: pf.blue_shift,
        }
    }
}
