//! RFB wire types consumed by the framebuffer decoders.
//!
//! # Wire Format Rules
//!
//! All structures follow these invariants:
//!
//! 1. **Big-endian byte order** - All multi-byte integers use network byte order
//! 2. **Strict boolean validation** - Boolean fields must be exactly 0 or 1 (any other value is an error)
//! 3. **Padding validation** - Padding bytes must be zero
//! 4. **All-or-nothing reads** - A structure is only consumed once it has fully arrived
//!
//! Rectangle headers are parsed here; the encoding-specific payload that
//! follows each header is left in the queue for a decoder.

mod proptest_framing;
pub mod types;

// Re-export commonly used types
pub use types::{PixelFormat, Rectangle, ENCODING_RAW, ENCODING_ZRLE};
