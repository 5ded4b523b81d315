//! Error types for framebuffer decoding.

use crate::inflate::InflateError;
use std::io;
use thiserror::Error;

/// Errors that can occur while decoding a rectangle.
///
/// A decoder shares one zlib stream with the server for the whole
/// connection, so once any of these is returned the stream position is
/// unknown. None of them can be recovered from by retrying the same call.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The decompressor could not produce even a single byte.
    #[error("Decompressor exhausted: could not inflate a single byte")]
    ProtocolExhaustion,

    /// Tile selector with no assigned sub-encoding.
    #[error("Unknown ZRLE sub-encoding: {0}")]
    UnknownSubEncoding(u8),

    /// The tile grid produced an empty tile for a non-empty rectangle.
    #[error("Tile geometry mismatch: {width}x{height} tile in a non-empty rectangle")]
    GeometryMismatch { width: u32, height: u32 },

    /// The compressed payload is not valid zlib data.
    #[error("Inflate error: {0}")]
    Inflate(#[source] flate2::DecompressError),

    /// A run extends past the end of the tile.
    #[error("Run of {run} pixels overflows tile ({remaining} pixels remaining)")]
    RunOverflow { run: usize, remaining: usize },

    /// A run-length encoding does not fit in 32 bits.
    #[error("Run length overflows u32")]
    RunLengthOverflow,

    /// A palette index refers past the end of the tile's palette.
    #[error("Palette index {index} out of range (palette size {size})")]
    PaletteIndexOutOfRange { index: u8, size: u8 },

    /// Bits per pixel rounds to zero bytes.
    #[error("Unsupported pixel format: {bits_per_pixel} bits per pixel")]
    UnsupportedPixelFormat { bits_per_pixel: u8 },

    /// Decompressed bytes left over after the last tile.
    #[error("{0} trailing bytes after decoding rectangle")]
    TrailingData(usize),

    /// An earlier decode failed part-way through; the decoder must be reset.
    #[error("Decoder desynchronized by an earlier failure; reset required")]
    Desynchronized,

    /// Receive queue error.
    #[error("Queue error: {0}")]
    Queue(#[from] io::Error),

    /// Display surface rejected a fill or blit.
    #[error("Display error: {0}")]
    Display(#[from] anyhow::Error),
}

impl DecodeError {
    /// Returns true if the connection's decoder state can no longer be
    /// trusted. This is currently every error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Returns true if this error was caused by malformed data from the
    /// server, as opposed to a local surface or queue failure.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        !matches!(self, Self::Queue(_) | Self::Display(_) | Self::Desynchronized)
    }
}

impl From<InflateError> for DecodeError {
    fn from(err: InflateError) -> Self {
        match err {
            InflateError::Short { .. } => Self::ProtocolExhaustion,
            InflateError::Corrupt(e) => Self::Inflate(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        assert!(DecodeError::ProtocolExhaustion.is_fatal());
        assert!(DecodeError::UnknownSubEncoding(129).is_fatal());
        assert!(DecodeError::Display(anyhow::anyhow!("out of bounds")).is_fatal());

        assert!(DecodeError::UnknownSubEncoding(17).is_protocol_error());
        assert!(DecodeError::TrailingData(3).is_protocol_error());
        assert!(!DecodeError::Desynchronized.is_protocol_error());
        assert!(!DecodeError::Queue(io::Error::from(io::ErrorKind::UnexpectedEof))
            .is_protocol_error());
    }

    #[test]
    fn test_from_inflate_error() {
        let err: DecodeError = InflateError::Short {
            requested: 1,
            available: 0,
        }
        .into();
        assert!(matches!(err, DecodeError::ProtocolExhaustion));
    }

    #[test]
    fn test_error_display() {
        let err = DecodeError::UnknownSubEncoding(129);
        assert_eq!(err.to_string(), "Unknown ZRLE sub-encoding: 129");

        let err = DecodeError::PaletteIndexOutOfRange { index: 5, size: 3 };
        assert_eq!(
            err.to_string(),
            "Palette index 5 out of range (palette size 3)"
        );

        let err = DecodeError::RunOverflow {
            run: 10,
            remaining: 4,
        };
        assert!(err.to_string().contains("4 pixels remaining"));
    }
}
