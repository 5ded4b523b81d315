//! Adaptive byte-stream reader over an [`Inflate`] implementation.
//!
//! Tile decoding needs `read_exact` semantics, but the inflater hands out
//! decompressed data in chunks and may be unable to satisfy a large request
//! near the end of a rectangle. [`ChunkStream`] keeps one chunk at a time
//! and, when a refill request comes back short, halves it until something
//! can be produced.

use crate::{DecodeError, Inflate, InflateError};
use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

/// Chunk request size for a rectangle whose compressed payload is
/// `compressed_len` bytes.
///
/// Payloads at least as large as `initial` keep `initial`. Smaller ones
/// start at one more than the largest power of two not above the length.
pub(crate) fn chunk_hint(compressed_len: u32, initial: usize) -> usize {
    let len = compressed_len as usize;
    if len >= initial {
        initial
    } else if len == 0 {
        1
    } else {
        1 + (1usize << len.ilog2())
    }
}

/// Source of decompressed tile bytes.
pub(crate) trait ByteSource {
    /// Read exactly `n` bytes. Never returns fewer.
    fn read_exact(&mut self, n: usize) -> Result<Bytes, DecodeError>;

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_exact(1)?[0])
    }
}

/// Current decompressed chunk and the size of the next refill request.
#[derive(Debug)]
pub(crate) struct ChunkStream {
    chunk: Bytes,
    hint: usize,
    initial: usize,
    adaptive: bool,
}

impl ChunkStream {
    pub(crate) fn new(initial: usize, adaptive: bool) -> Self {
        let initial = initial.max(1);
        Self {
            chunk: Bytes::new(),
            hint: initial,
            initial,
            adaptive,
        }
    }

    /// Prepare for a new rectangle's payload.
    pub(crate) fn begin_rect(&mut self, compressed_len: u32) {
        self.chunk.clear();
        self.hint = if self.adaptive {
            chunk_hint(compressed_len, self.initial)
        } else {
            self.initial
        };
    }

    pub(crate) fn hint(&self) -> usize {
        self.hint
    }

    /// Drop the unread rest of the current chunk, returning how many bytes
    /// were dropped.
    pub(crate) fn discard(&mut self) -> usize {
        let dropped = self.chunk.len();
        self.chunk.clear();
        dropped
    }

    pub(crate) fn reset(&mut self) {
        self.chunk.clear();
        self.hint = self.initial;
    }

    fn refill<I: Inflate + ?Sized>(&mut self, inflater: &mut I) -> Result<(), DecodeError> {
        let mut request = self.hint;
        loop {
            match inflater.inflate(request, false) {
                Ok(chunk) => {
                    if self.adaptive {
                        self.hint = chunk.len();
                    }
                    self.chunk = chunk;
                    return Ok(());
                }
                Err(InflateError::Short { available, .. }) => {
                    if request == 1 {
                        return Err(DecodeError::ProtocolExhaustion);
                    }
                    let next = request.div_ceil(2);
                    trace!(request, next, available, "Inflater short, halving chunk request");
                    request = next;
                }
                Err(InflateError::Corrupt(e)) => return Err(DecodeError::Inflate(e)),
            }
        }
    }

    fn ensure_chunk<I: Inflate + ?Sized>(&mut self, inflater: &mut I) -> Result<(), DecodeError> {
        if self.chunk.is_empty() {
            self.refill(inflater)?;
        }
        Ok(())
    }
}

/// A [`ChunkStream`] paired with the inflater that feeds it.
pub(crate) struct Inflating<'a, I: Inflate + ?Sized> {
    pub(crate) stream: &'a mut ChunkStream,
    pub(crate) inflater: &'a mut I,
}

impl<I: Inflate + ?Sized> ByteSource for Inflating<'_, I> {
    fn read_exact(&mut self, n: usize) -> Result<Bytes, DecodeError> {
        if n == 0 {
            return Ok(Bytes::new());
        }
        self.stream.ensure_chunk(&mut *self.inflater)?;
        if self.stream.chunk.len() >= n {
            return Ok(self.stream.chunk.split_to(n));
        }

        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            self.stream.ensure_chunk(&mut *self.inflater)?;
            let take = (n - out.len()).min(self.stream.chunk.len());
            out.extend_from_slice(&self.stream.chunk.split_to(take));
        }
        Ok(out.freeze())
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.stream.ensure_chunk(&mut *self.inflater)?;
        Ok(self.stream.chunk.get_u8())
    }
}

/// Already-decompressed bytes, for exercising tile decoding directly.
#[cfg(test)]
impl ByteSource for Bytes {
    fn read_exact(&mut self, n: usize) -> Result<Bytes, DecodeError> {
        if self.len() < n {
            return Err(DecodeError::ProtocolExhaustion);
        }
        Ok(self.split_to(n))
    }
}
