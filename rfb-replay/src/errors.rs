//! Error types for the replay tool.

use rfb_encodings::DecodeError;
use std::io;
use thiserror::Error;

/// Errors that can occur while replaying a capture.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Reading the capture or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with the capture magic.
    #[error("Not a ZRLE capture file (bad magic)")]
    BadMagic,

    /// A rectangle uses an encoding the replay tool has no decoder for.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(i32),

    /// The decoder rejected a rectangle.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The capture ended part-way through a header or rectangle.
    #[error("Capture truncated: {0}")]
    Truncated(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// PNG encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ReplayError {
    /// Returns true if the capture file itself is at fault, as opposed to
    /// the environment or configuration.
    #[must_use]
    pub fn is_bad_capture(&self) -> bool {
        match self {
            Self::BadMagic | Self::UnsupportedEncoding(_) | Self::Truncated(_) => true,
            Self::Decode(e) => e.is_protocol_error(),
            _ => false,
        }
    }
}
