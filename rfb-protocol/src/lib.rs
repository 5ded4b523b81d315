//! RFB (Remote Framebuffer) receive-side protocol plumbing.
//!
//! This crate provides the byte-level layer that sits underneath the
//! framebuffer decoders: a non-blocking receive queue that buffers bytes as
//! they arrive from the network, and the fixed-size wire types (pixel format,
//! rectangle header) that are parsed out of it.
//!
//! # Modules
//!
//! - [`io`] - The [`ReadQueue`] trait and the [`RecvQueue`] implementation
//! - [`messages`] - Wire types and encoding constants
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::{ReadQueue, RecvQueue};
//!
//! let mut queue = RecvQueue::new();
//! queue.push(&[0x00, 0x00]);
//! assert!(queue.must_wait(4)); // a u32 length prefix has not fully arrived
//!
//! queue.push(&[0x01, 0x00]);
//! assert!(!queue.must_wait(4));
//! assert_eq!(queue.read_u32().unwrap(), 256);
//! ```

pub mod io;
pub mod messages;

// Re-export commonly used types
pub use io::{ReadQueue, RecvQueue};
pub use messages::{PixelFormat, Rectangle};
