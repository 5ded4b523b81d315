//! Framebuffer decoding for RFB (VNC) rectangles.
//!
//! This crate implements the ZRLE encoding as a non-blocking, resumable
//! decoder. A decoder reads one framebuffer update rectangle from a
//! [`ReadQueue`], decompresses it with a per-connection zlib stream, and
//! writes the pixels into a [`DisplaySurface`].
//!
//! # Key Concepts
//!
//! - **Non-blocking**: decoders never wait on the network; they return
//!   [`DecodeStatus::NeedData`] and are called again when more bytes arrive
//! - **Rectangle-based**: decoders operate on a single rectangle at a time
//! - **Fail-fast policy**: every [`DecodeError`] is fatal for the connection's
//!   decoder state; there are no defensive fallbacks
//! - **Encoding types**: each decoder handles one RFB encoding type (the
//!   `i32` identifier from the rectangle header)
//!
//! # Example
//!
//! ```
//! use rfb_encodings::{DecodeStatus, Decoder, ZrleDecoder, ENCODING_ZRLE};
//! use rfb_pixelbuffer::{ManagedPixelBuffer, PixelFormat as ClientFormat};
//! use rfb_protocol::{PixelFormat, RecvQueue, Rectangle};
//!
//! let mut decoder: Box<dyn Decoder> = Box::new(ZrleDecoder::new());
//! assert_eq!(decoder.encoding_type(), ENCODING_ZRLE);
//!
//! let server_format = PixelFormat {
//!     bits_per_pixel: 32,
//!     depth: 24,
//!     big_endian: 0,
//!     true_color: 1,
//!     red_max: 255,
//!     green_max: 255,
//!     blue_max: 255,
//!     red_shift: 0,
//!     green_shift: 8,
//!     blue_shift: 16,
//! };
//! let rect = Rectangle { x: 0, y: 0, width: 16, height: 16, encoding: ENCODING_ZRLE };
//! let mut framebuffer = ManagedPixelBuffer::new(16, 16, ClientFormat::rgb888());
//! let mut queue = RecvQueue::new();
//!
//! // Nothing has arrived yet
//! let status = decoder.decode(&rect, &mut queue, &server_format, &mut framebuffer).unwrap();
//! assert_eq!(status, DecodeStatus::NeedData);
//! ```

pub mod config;
pub mod error;
pub mod inflate;
pub mod zrle;

pub use config::{DecoderConfig, DEFAULT_CHUNK_SIZE};
pub use error::DecodeError;
pub use inflate::{Inflate, InflateError, Inflator};
pub use zrle::{Phase, SubEncoding, ZrleDecoder, TILE_SIZE};

// Re-export types from rfb-protocol and rfb-pixelbuffer used by decoders
pub use rfb_pixelbuffer::DisplaySurface;
pub use rfb_protocol::messages::{ENCODING_RAW, ENCODING_ZRLE};
pub use rfb_protocol::{PixelFormat, ReadQueue, Rectangle};

/// Outcome of a decode call that did not fail.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// More bytes must be queued before the rectangle can be decoded; call
    /// again with the same rectangle.
    NeedData,
    /// The rectangle has been written to the display surface.
    Complete,
}

impl DecodeStatus {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

/// A decoder for one RFB encoding type.
///
/// Object safe, so a connection can hold decoders as `Box<dyn Decoder>`
/// keyed by [`encoding_type`](Self::encoding_type).
pub trait Decoder {
    /// The encoding type this decoder handles.
    fn encoding_type(&self) -> i32;

    /// Decode `rect` from `queue` onto `display`.
    ///
    /// `pixel_format` is the format negotiated with the server. Returns
    /// [`DecodeStatus::NeedData`] while the rectangle's data is incomplete.
    fn decode(
        &mut self,
        rect: &Rectangle,
        queue: &mut dyn ReadQueue,
        pixel_format: &PixelFormat,
        display: &mut dyn DisplaySurface,
    ) -> Result<DecodeStatus, DecodeError>;

    /// Return to the initial state, e.g. for a new connection.
    fn reset(&mut self) {}
}

impl<I: Inflate> Decoder for ZrleDecoder<I> {
    fn encoding_type(&self) -> i32 {
        ENCODING_ZRLE
    }

    fn decode(
        &mut self,
        rect: &Rectangle,
        queue: &mut dyn ReadQueue,
        pixel_format: &PixelFormat,
        display: &mut dyn DisplaySurface,
    ) -> Result<DecodeStatus, DecodeError> {
        self.decode_rect(
            rect,
            queue,
            display,
            pixel_format.depth,
            pixel_format.bits_per_pixel,
        )
    }

    fn reset(&mut self) {
        ZrleDecoder::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_constants() {
        assert_eq!(ENCODING_RAW, 0);
        assert_eq!(ENCODING_ZRLE, 16);
    }

    #[test]
    fn test_decoder_is_object_safe() {
        let decoders: Vec<Box<dyn Decoder>> = vec![Box::new(ZrleDecoder::new())];
        assert_eq!(decoders[0].encoding_type(), ENCODING_ZRLE);
    }

    #[test]
    fn test_decode_status() {
        assert!(DecodeStatus::Complete.is_complete());
        assert!(!DecodeStatus::NeedData.is_complete());
    }
}
