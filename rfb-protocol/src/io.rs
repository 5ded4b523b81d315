//! Non-blocking receive queue for RFB protocol data.
//!
//! Decoders in this workspace never block on the network. Instead the
//! connection layer pushes whatever bytes have arrived into a queue, and a
//! decoder first asks [`ReadQueue::must_wait`] whether enough bytes are
//! buffered for its next step. If not, it returns "not ready" and is invoked
//! again once more data has been pushed.
//!
//! All multi-byte integers are read in network byte order (big-endian).
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::io::{ReadQueue, RecvQueue};
//!
//! let mut queue = RecvQueue::new();
//! queue.push(&[0x00, 0x00, 0x00, 0x03, b'a', b'b']);
//!
//! let len = queue.read_u32().unwrap() as usize;
//! assert!(queue.must_wait(len)); // only 2 of 3 payload bytes buffered
//!
//! queue.push(b"c");
//! assert_eq!(&queue.read_bytes(len).unwrap()[..], b"abc");
//! ```

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Byte source consumed by the decoders.
///
/// Only [`available`](Self::available) and [`read_bytes`](Self::read_bytes)
/// are required; the fixed-width readers have default implementations built
/// on top of them.
///
/// # Contract
///
/// Callers are expected to check [`must_wait`](Self::must_wait) before
/// reading. Reading more bytes than are buffered is a caller bug and is
/// reported as [`std::io::ErrorKind::UnexpectedEof`] rather than blocking.
pub trait ReadQueue {
    /// Number of bytes currently buffered.
    fn available(&self) -> usize;

    /// Remove and return exactly `n` bytes from the front of the queue.
    fn read_bytes(&mut self, n: usize) -> std::io::Result<Bytes>;

    /// Returns `true` if fewer than `min_bytes` bytes are buffered, meaning
    /// the caller must wait for more data before reading.
    fn must_wait(&self, min_bytes: usize) -> bool {
        self.available() < min_bytes
    }

    /// Read a single byte.
    fn read_u8(&mut self) -> std::io::Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a 16-bit unsigned integer in network byte order.
    fn read_u16(&mut self) -> std::io::Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a 32-bit unsigned integer in network byte order.
    fn read_u32(&mut self) -> std::io::Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 32-bit signed integer in network byte order.
    fn read_i32(&mut self) -> std::io::Result<i32> {
        Ok(self.read_u32()? as i32)
    }
}

/// Growable in-memory receive queue.
///
/// Bytes are appended with [`push`](Self::push) or pulled from an async
/// reader with [`fill_from`](Self::fill_from), and consumed through the
/// [`ReadQueue`] trait. Reads hand out [`Bytes`] views split off the front of
/// the internal buffer, so large payloads are not copied.
#[derive(Debug, Default)]
pub struct RecvQueue {
    buffer: BytesMut,
    total_received: u64,
}

impl RecvQueue {
    /// Create an empty queue with the default capacity (8KB).
    pub fn new() -> Self {
        Self::with_capacity(8192)
    }

    /// Create an empty queue with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            total_received: 0,
        }
    }

    /// Append received bytes to the back of the queue.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        self.total_received += data.len() as u64;
    }

    /// Perform a single read of at most `max_bytes` from `reader` into the
    /// queue.
    ///
    /// Returns the number of bytes appended; `Ok(0)` means the reader is at
    /// EOF (or `max_bytes` was 0).
    ///
    /// # Examples
    ///
    /// ```
    /// # use rfb_protocol::{ReadQueue, RecvQueue};
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> std::io::Result<()> {
    /// let mut reader = std::io::Cursor::new(vec![1u8, 2, 3, 4, 5]);
    /// let mut queue = RecvQueue::new();
    ///
    /// let n = queue.fill_from(&mut reader, 2).await?;
    /// assert_eq!(n, 2);
    /// assert_eq!(queue.available(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fill_from<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
        max_bytes: usize,
    ) -> std::io::Result<usize> {
        if max_bytes == 0 {
            return Ok(0);
        }
        self.buffer.reserve(max_bytes);
        let mut limited = reader.take(max_bytes as u64);
        let n = limited.read_buf(&mut self.buffer).await?;
        self.total_received += n as u64;
        Ok(n)
    }

    /// Total number of bytes ever pushed into this queue.
    pub fn total_received(&self) -> u64 {
        self.total_received
    }

    /// True if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

}

impl ReadQueue for RecvQueue {
    fn available(&self) -> usize {
        self.buffer.len()
    }

    fn read_bytes(&mut self, n: usize) -> std::io::Result<Bytes> {
        ensure_available(self.buffer.len(), n)?;
        Ok(self.buffer.split_to(n).freeze())
    }

    fn read_u8(&mut self) -> std::io::Result<u8> {
        ensure_available(self.buffer.len(), 1)?;
        Ok(self.buffer.get_u8())
    }

    fn read_u16(&mut self) -> std::io::Result<u16> {
        ensure_available(self.buffer.len(), 2)?;
        Ok(self.buffer.get_u16())
    }

    fn read_u32(&mut self) -> std::io::Result<u32> {
        ensure_available(self.buffer.len(), 4)?;
        Ok(self.buffer.get_u32())
    }

    fn read_i32(&mut self) -> std::io::Result<i32> {
        ensure_available(self.buffer.len(), 4)?;
        Ok(self.buffer.get_i32())
    }
}

fn ensure_available(have: usize, need: usize) -> std::io::Result<()> {
    if have < need {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, got {}", need, have),
        ));
    }
    Ok(())
}
