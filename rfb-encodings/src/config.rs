//! Decoder configuration.

use serde::{Deserialize, Serialize};

/// Default decompressed chunk size requested from the inflater (10 KiB + 1).
pub const DEFAULT_CHUNK_SIZE: usize = 1 + 1024 * 10;

/// Tunables for [`ZrleDecoder`](crate::ZrleDecoder).
///
/// Deserializes from a TOML table; missing keys take their defaults.
///
/// ```
/// use rfb_encodings::DecoderConfig;
///
/// let config = DecoderConfig::default();
/// assert_eq!(config.initial_chunk_size, 10241);
/// assert!(config.adaptive_chunk_sizing);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Number of decompressed bytes requested per refill at the start of
    /// each rectangle.
    pub initial_chunk_size: usize,

    /// Shrink the refill request for small payloads and keep it at the size
    /// of the last chunk obtained.
    pub adaptive_chunk_sizing: bool,

    /// Fail with [`DecodeError::TrailingData`](crate::DecodeError::TrailingData)
    /// instead of logging a warning when bytes are left after the last tile.
    pub reject_trailing_data: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            initial_chunk_size: DEFAULT_CHUNK_SIZE,
            adaptive_chunk_sizing: true,
            reject_trailing_data: false,
        }
    }
}

impl DecoderConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_chunk_size == 0 {
            return Err("initial_chunk_size cannot be 0".to_string());
        }
        Ok(())
    }
}
